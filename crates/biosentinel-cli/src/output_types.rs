use serde::Serialize;
use tabled::Tabled;

use biosentinel_core::models::{BoundingBox, Point};
use biosentinel_pipeline::ChunkPreview;

/// Output for grid command
#[derive(Debug, Serialize)]
pub struct GridOutput {
    pub bbox: BoundingBox,
    pub resolution: f64,
    pub columns: usize,
    pub rows: usize,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

#[derive(Debug, Tabled)]
pub struct PointRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Longitude")]
    pub lon: f64,
    #[tabled(rename = "Latitude")]
    pub lat: f64,
}

/// Output for predict command
#[derive(Debug, Serialize)]
pub struct PredictOutput {
    pub output: String,
    pub points: usize,
    pub cache_hits: usize,
    pub cache_fetches: usize,
    pub no_data: Vec<(String, usize)>,
}

#[derive(Debug, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "Layer")]
    pub name: String,
    #[tabled(rename = "No-data points")]
    pub no_data: usize,
}

/// Output for extract command
#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    pub dataset: String,
    pub records: usize,
    pub submitted: Vec<SubmittedChunk>,
    pub skipped: Vec<usize>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct SubmittedChunk {
    #[tabled(rename = "Chunk")]
    pub chunk_index: usize,
    #[tabled(rename = "Task")]
    pub task_id: String,
    #[tabled(rename = "Export")]
    pub description: String,
    #[tabled(rename = "Features")]
    pub features: usize,
}

#[derive(Debug, Tabled)]
pub struct PreviewRow {
    #[tabled(rename = "Chunk")]
    pub chunk_index: usize,
    #[tabled(rename = "Records")]
    pub records: usize,
    #[tabled(rename = "In region")]
    pub in_region: usize,
}

impl From<&ChunkPreview> for PreviewRow {
    fn from(preview: &ChunkPreview) -> Self {
        Self {
            chunk_index: preview.chunk_index,
            records: preview.records,
            in_region: preview.in_region,
        }
    }
}

/// Output for prepare command
#[derive(Debug, Serialize, Tabled)]
pub struct PreparedOutput {
    #[tabled(rename = "Input")]
    pub input: String,
    #[tabled(rename = "Output")]
    pub output: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
    #[tabled(rename = "Dropped")]
    pub dropped: usize,
}

/// One configuration entry with its source
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
