//! Chunked submission of training polygons for remote extraction.

use chrono::Utc;

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{
    ChunkOutcome, ExportDescriptor, ExportFormat, ExportTask, FeatureCollectionRequest,
    FeatureRecord, Geometry, PropertySchema, ReduceSpec, UnknownKeyPolicy,
};
use biosentinel_core::ports::ImageryService;
use biosentinel_core::processing::chunk::{partition, Chunk};

/// Amazon training region `[min_lon, min_lat, max_lon, max_lat]`
pub const AMAZON_REFERENCE_BBOX: [f64; 4] = [-76.811428, -7.886508, -60.365238, 5.640415];

/// Drive folder exports are written to
pub const DEFAULT_EXPORT_FOLDER: &str = "EarthEngineExports";

/// Closed rectangle over [`AMAZON_REFERENCE_BBOX`]
pub fn amazon_reference_region() -> Geometry {
    let [min_lon, min_lat, max_lon, max_lat] = AMAZON_REFERENCE_BBOX;
    Geometry::polygon(vec![vec![
        [min_lon, min_lat],
        [max_lon, min_lat],
        [max_lon, max_lat],
        [min_lon, max_lat],
        [min_lon, min_lat],
    ]])
}

/// Partitions repaired records and submits one export per non-empty chunk
pub struct FeatureBatcher<R: ImageryService> {
    remote: R,
    schema: PropertySchema,
    filter_region: Option<Geometry>,
    reduce: ReduceSpec,
}

impl<R: ImageryService> FeatureBatcher<R> {
    /// Batcher filtering against the Amazon reference region with the training schema
    pub fn new(remote: R, reduce: ReduceSpec) -> Self {
        Self {
            remote,
            schema: PropertySchema::training(),
            filter_region: Some(amazon_reference_region()),
            reduce,
        }
    }

    /// Replace the reference region. `None` submits chunks unfiltered.
    pub fn with_filter_region(mut self, region: Option<Geometry>) -> Self {
        self.filter_region = region;
        self
    }

    pub fn with_schema(mut self, schema: PropertySchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn filter_region(&self) -> Option<&Geometry> {
        self.filter_region.as_ref()
    }

    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    pub fn partition<'a>(
        &self,
        records: &'a [FeatureRecord],
        chunk_size: usize,
    ) -> Result<Vec<Chunk<'a, FeatureRecord>>> {
        partition(records, chunk_size)
    }

    /// Submit one chunk.
    ///
    /// Returns [`ChunkOutcome::Empty`] without exporting when the remote
    /// service reports no features left after filtering. Otherwise returns as
    /// soon as the export task is accepted.
    pub fn submit(
        &self,
        chunk: &Chunk<'_, FeatureRecord>,
        descriptor: &ExportDescriptor,
    ) -> Result<ChunkOutcome> {
        let features = chunk
            .items
            .iter()
            .map(|record| self.admit(record))
            .collect::<Result<Vec<_>>>()?;
        let collection = FeatureCollectionRequest::new(features, self.filter_region.clone());

        let feature_count = self.remote.count_features(&collection)?;
        if feature_count == 0 {
            tracing::info!(
                chunk = chunk.index,
                records = chunk.len(),
                export = %descriptor.description,
                "Chunk is empty after filtering, skipping export"
            );
            return Ok(ChunkOutcome::Empty { chunk_index: chunk.index });
        }

        let table = self.remote.reduce_over_features(&collection, &self.reduce)?;
        let task_id = self.remote.export_table_async(&table, descriptor)?;

        tracing::info!(
            task_id = %task_id,
            chunk = chunk.index,
            export = %descriptor.description,
            features = feature_count,
            "Export task submitted"
        );

        Ok(ChunkOutcome::Submitted(ExportTask {
            chunk_index: chunk.index,
            task_id,
            description: descriptor.description.clone(),
            feature_count,
            submitted_at: Utc::now(),
        }))
    }

    /// Partition `records` and submit every chunk in order as `{name}_chunk_{i}`.
    ///
    /// Empty chunks are skipped; the first remote failure aborts the run.
    pub fn run(
        &self,
        name: &str,
        records: &[FeatureRecord],
        chunk_size: usize,
        folder: &str,
        format: ExportFormat,
    ) -> Result<Vec<ChunkOutcome>> {
        let chunks = self.partition(records, chunk_size)?;
        tracing::info!(dataset = name, records = records.len(), chunks = chunks.len(), "Submitting chunks");

        chunks
            .iter()
            .map(|chunk| {
                let descriptor = ExportDescriptor::for_chunk(name, chunk.index, folder, format);
                self.submit(chunk, &descriptor)
            })
            .collect()
    }

    /// Apply the schema's unknown-key policy to an already typed record
    fn admit(&self, record: &FeatureRecord) -> Result<FeatureRecord> {
        let mut admitted = record.clone();
        if let Some(key) = record.properties.keys().find(|k| !self.schema.allowed.contains(*k)) {
            match self.schema.unknown_keys {
                UnknownKeyPolicy::Reject => {
                    return Err(BioSentinelError::PropertyRejected {
                        record: record.id,
                        key: key.clone(),
                        reason: format!("not part of the '{}' schema", self.schema.name),
                    });
                }
                UnknownKeyPolicy::Ignore => {
                    admitted.properties.retain(|k, _| self.schema.allowed.contains(k));
                    tracing::debug!(record = record.id, schema = %self.schema.name, "Dropped unknown properties");
                }
            }
        }
        Ok(admitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosentinel_core::models::{LayerRef, Properties, PropertyValue, TableHandle, TaskId};
    use biosentinel_core::models::DateRange;
    use std::cell::RefCell;

    /// Records every collection it is asked about; reports `counts` in order
    struct ScriptedRemote {
        counts: RefCell<Vec<usize>>,
        collections: RefCell<Vec<FeatureCollectionRequest>>,
        exports: RefCell<Vec<ExportDescriptor>>,
    }

    impl ScriptedRemote {
        fn new(counts: Vec<usize>) -> Self {
            Self {
                counts: RefCell::new(counts),
                collections: RefCell::new(Vec::new()),
                exports: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageryService for ScriptedRemote {
        fn fetch_raster(&self, _layer: &LayerRef) -> Result<Vec<u8>> {
            unimplemented!("not used by the batcher")
        }

        fn count_features(&self, collection: &FeatureCollectionRequest) -> Result<usize> {
            self.collections.borrow_mut().push(collection.clone());
            Ok(self.counts.borrow_mut().remove(0))
        }

        fn reduce_over_features(
            &self,
            _collection: &FeatureCollectionRequest,
            _spec: &ReduceSpec,
        ) -> Result<TableHandle> {
            Ok(TableHandle("table".to_string()))
        }

        fn export_table_async(
            &self,
            _table: &TableHandle,
            destination: &ExportDescriptor,
        ) -> Result<TaskId> {
            self.exports.borrow_mut().push(destination.clone());
            Ok(TaskId(format!("task-{}", self.exports.borrow().len())))
        }
    }

    fn spec() -> ReduceSpec {
        ReduceSpec::training(DateRange::parse("2023-01-01", "2024-01-01").unwrap())
    }

    fn record(id: u64, properties: Properties) -> FeatureRecord {
        FeatureRecord::new(
            id,
            Geometry::polygon(vec![vec![[-70.0, 0.0], [-69.9, 0.0], [-69.9, 0.1], [-70.0, 0.0]]]),
            properties,
        )
    }

    #[test]
    fn test_reference_region_is_closed_amazon_box() {
        let region = amazon_reference_region();
        assert!(region.is_closed());
        assert_eq!(region.rings().next().unwrap()[2], [-60.365238, 5.640415]);
    }

    #[test]
    fn test_empty_chunk_is_not_exported() {
        let remote = ScriptedRemote::new(vec![0]);
        let batcher = FeatureBatcher::new(&remote, spec());
        let records = vec![record(0, Properties::new())];
        let chunks = batcher.partition(&records, 10).unwrap();
        let descriptor = ExportDescriptor::for_chunk("birds", 0, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv);

        let outcome = batcher.submit(&chunks[0], &descriptor).unwrap();
        assert_eq!(outcome, ChunkOutcome::Empty { chunk_index: 0 });
        assert!(remote.exports.borrow().is_empty());
    }

    #[test]
    fn test_submit_carries_filter_region_and_task_id() {
        let remote = ScriptedRemote::new(vec![1]);
        let batcher = FeatureBatcher::new(&remote, spec());
        let records = vec![record(5, Properties::new())];
        let chunks = batcher.partition(&records, 10).unwrap();
        let descriptor = ExportDescriptor::for_chunk("birds", 0, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv);

        match batcher.submit(&chunks[0], &descriptor).unwrap() {
            ChunkOutcome::Submitted(task) => {
                assert_eq!(task.task_id, TaskId("task-1".to_string()));
                assert_eq!(task.description, "Export_birds_chunk_0");
                assert_eq!(task.feature_count, 1);
            }
            other => panic!("Expected Submitted, got {:?}", other),
        }

        let sent = remote.collections.borrow();
        assert_eq!(sent[0].filter_region, Some(amazon_reference_region()));
        assert_eq!(sent[0].features[0].id, 5);
    }

    #[test]
    fn test_unknown_properties_dropped_under_training_schema() {
        let remote = ScriptedRemote::new(vec![1]);
        let batcher = FeatureBatcher::new(&remote, spec());

        let mut properties = Properties::new();
        properties.insert("Biota_Overlap".to_string(), PropertyValue::Number(0.3));
        properties.insert("observer".to_string(), PropertyValue::Text("jm".to_string()));
        let records = vec![record(0, properties)];
        let chunks = batcher.partition(&records, 1).unwrap();
        let descriptor = ExportDescriptor::for_chunk("birds", 0, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv);

        batcher.submit(&chunks[0], &descriptor).unwrap();
        let sent = remote.collections.borrow();
        let keys: Vec<&String> = sent[0].features[0].properties.keys().collect();
        assert_eq!(keys, vec!["Biota_Overlap"]);
    }

    #[test]
    fn test_unknown_properties_rejected_under_strict_schema() {
        let remote = ScriptedRemote::new(vec![1]);
        let strict = PropertySchema::new("strict", ["Biota_Overlap"], UnknownKeyPolicy::Reject);
        let batcher = FeatureBatcher::new(&remote, spec()).with_schema(strict);

        let mut properties = Properties::new();
        properties.insert("observer".to_string(), PropertyValue::Text("jm".to_string()));
        let records = vec![record(9, properties)];
        let chunks = batcher.partition(&records, 1).unwrap();
        let descriptor = ExportDescriptor::for_chunk("birds", 0, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv);

        match batcher.submit(&chunks[0], &descriptor) {
            Err(BioSentinelError::PropertyRejected { record, key, .. }) => {
                assert_eq!(record, 9);
                assert_eq!(key, "observer");
            }
            other => panic!("Expected PropertyRejected, got {:?}", other),
        }
        assert!(remote.collections.borrow().is_empty());
    }

    #[test]
    fn test_run_rejects_zero_chunk_size() {
        let remote = ScriptedRemote::new(vec![]);
        let batcher = FeatureBatcher::new(&remote, spec());
        let result = batcher.run("birds", &[record(0, Properties::new())], 0, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv);
        assert!(matches!(result, Err(BioSentinelError::InvalidChunkSize { size: 0 })));
    }
}
