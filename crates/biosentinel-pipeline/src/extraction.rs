//! Training extraction: read, repair, batch and submit a polygon dataset.

use std::path::Path;

use serde::Serialize;

use biosentinel_core::error::Result;
use biosentinel_core::models::{ChunkOutcome, ExportFormat, FeatureRecord, Geometry};
use biosentinel_core::ports::ImageryService;
use biosentinel_core::processing::partition;
use biosentinel_geo::read_feature_collection;
use biosentinel_geo::spatial::count_matches;

use crate::batcher::{FeatureBatcher, DEFAULT_EXPORT_FOLDER};

/// Naming and destination of one extraction run
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub name: String,
    pub chunk_size: usize,
    pub folder: String,
    pub format: ExportFormat,
}

impl ExtractionRequest {
    /// CSV export of `name` into the default folder
    pub fn new(name: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            name: name.into(),
            chunk_size,
            folder: DEFAULT_EXPORT_FOLDER.to_string(),
            format: ExportFormat::Csv,
        }
    }
}

/// Dataset name derived from a file path: its stem
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

/// Per-chunk outcomes of one run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub name: String,
    pub records: usize,
    pub outcomes: Vec<ChunkOutcome>,
}

impl ExtractionReport {
    pub fn submitted(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, ChunkOutcome::Submitted(_))).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, ChunkOutcome::Empty { .. })).count()
    }
}

/// Local estimate of one chunk's contents, no remote call involved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkPreview {
    pub chunk_index: usize,
    pub records: usize,
    /// Records intersecting the reference region
    pub in_region: usize,
}

/// Parse `content` with the batcher's schema and submit every chunk
pub fn extract<R: ImageryService>(
    batcher: &FeatureBatcher<R>,
    content: &str,
    request: &ExtractionRequest,
) -> Result<ExtractionReport> {
    let records = read_feature_collection(content, batcher.schema())?;
    let outcomes = batcher.run(
        &request.name,
        &records,
        request.chunk_size,
        &request.folder,
        request.format,
    )?;

    let report = ExtractionReport { name: request.name.clone(), records: records.len(), outcomes };
    tracing::info!(
        dataset = %report.name,
        submitted = report.submitted(),
        skipped = report.skipped(),
        "Extraction run finished"
    );
    Ok(report)
}

/// Chunk the records locally and count how many of each fall in `region`
pub fn preview(
    records: &[FeatureRecord],
    chunk_size: usize,
    region: Option<&Geometry>,
) -> Result<Vec<ChunkPreview>> {
    Ok(partition(records, chunk_size)?
        .iter()
        .map(|chunk| ChunkPreview {
            chunk_index: chunk.index,
            records: chunk.len(),
            in_region: count_matches(chunk.items, region),
        })
        .collect())
}
