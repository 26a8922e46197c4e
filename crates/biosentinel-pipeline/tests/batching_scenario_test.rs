//! Chunked extraction against a mock remote that filters by intersection locally

use std::cell::RefCell;

use biosentinel_core::error::Result;
use biosentinel_core::models::{
    ChunkOutcome, DateRange, ExportDescriptor, ExportFormat, FeatureCollectionRequest,
    FeatureRecord, Geometry, LayerRef, Properties, ReduceSpec, TableHandle, TaskId,
};
use biosentinel_core::ports::ImageryService;
use biosentinel_geo::spatial::count_matches;
use biosentinel_pipeline::{extract, FeatureBatcher, ExtractionRequest, DEFAULT_EXPORT_FOLDER};

#[derive(Default)]
struct FilteringRemote {
    counts: RefCell<usize>,
    reductions: RefCell<usize>,
    exports: RefCell<Vec<String>>,
}

impl ImageryService for FilteringRemote {
    fn fetch_raster(&self, _layer: &LayerRef) -> Result<Vec<u8>> {
        unimplemented!("extraction never fetches rasters")
    }

    fn count_features(&self, collection: &FeatureCollectionRequest) -> Result<usize> {
        *self.counts.borrow_mut() += 1;
        Ok(count_matches(&collection.features, collection.filter_region.as_ref()))
    }

    fn reduce_over_features(
        &self,
        _collection: &FeatureCollectionRequest,
        _spec: &ReduceSpec,
    ) -> Result<TableHandle> {
        *self.reductions.borrow_mut() += 1;
        Ok(TableHandle(format!("table-{}", self.reductions.borrow())))
    }

    fn export_table_async(&self, _table: &TableHandle, destination: &ExportDescriptor) -> Result<TaskId> {
        self.exports.borrow_mut().push(destination.description.clone());
        Ok(TaskId(format!("TASK_{}", self.exports.borrow().len())))
    }
}

fn square(lon: f64, lat: f64) -> Geometry {
    let d = 0.01;
    Geometry::polygon(vec![vec![
        [lon, lat],
        [lon + d, lat],
        [lon + d, lat + d],
        [lon, lat + d],
        [lon, lat],
    ]])
}

/// 4500 records; the second block of 2000 lies in the Atlantic, outside the Amazon region
fn records() -> Vec<FeatureRecord> {
    (0..4500u64)
        .map(|id| {
            let geometry = if (2000..4000).contains(&id) { square(-30.0, 0.0) } else { square(-70.0, -2.0) };
            FeatureRecord::new(id, geometry, Properties::new())
        })
        .collect()
}

fn spec() -> ReduceSpec {
    ReduceSpec::training(DateRange::parse("2023-01-01", "2024-01-01").unwrap())
}

#[test]
fn test_empty_chunk_skipped_and_run_continues() {
    let remote = FilteringRemote::default();
    let batcher = FeatureBatcher::new(&remote, spec());
    let records = records();

    let chunks = batcher.partition(&records, 2000).unwrap();
    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![2000, 2000, 500]);

    let outcomes = batcher
        .run("amphibians", &records, 2000, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv)
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(&outcomes[0], ChunkOutcome::Submitted(task) if task.feature_count == 2000));
    assert_eq!(outcomes[1], ChunkOutcome::Empty { chunk_index: 1 });
    assert!(matches!(&outcomes[2], ChunkOutcome::Submitted(task) if task.chunk_index == 2));

    assert_eq!(*remote.counts.borrow(), 3);
    assert_eq!(*remote.reductions.borrow(), 2);
    assert_eq!(
        *remote.exports.borrow(),
        vec!["Export_amphibians_chunk_0".to_string(), "Export_amphibians_chunk_2".to_string()]
    );
}

#[test]
fn test_unfiltered_batcher_exports_every_chunk() {
    let remote = FilteringRemote::default();
    let batcher = FeatureBatcher::new(&remote, spec()).with_filter_region(None);

    let outcomes = batcher
        .run("amphibians", &records(), 2000, DEFAULT_EXPORT_FOLDER, ExportFormat::Csv)
        .unwrap();

    assert!(outcomes.iter().all(|o| matches!(o, ChunkOutcome::Submitted(_))));
    assert_eq!(remote.exports.borrow().len(), 3);
}

#[test]
fn test_extract_from_geojson_keeps_positional_ids() {
    let content = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": null, "properties": {"Biota_Overlap": 0.1}},
            {"type": "Feature",
             "geometry": {"type": "Polygon", "coordinates": [[[-70.0, -2.0], [-69.9, -2.0], [-69.9, -1.9]]]},
             "properties": {"Biota_Overlap": 0.4, "Rel_Occupancy": 0.2, "collector": "field"}}
        ]
    }"#;

    let remote = FilteringRemote::default();
    let batcher = FeatureBatcher::new(&remote, spec());
    let report = extract(&batcher, content, &ExtractionRequest::new("frogs", 10)).unwrap();

    assert_eq!(report.records, 1);
    assert_eq!(report.submitted(), 1);
    assert_eq!(report.skipped(), 0);
    match &report.outcomes[0] {
        ChunkOutcome::Submitted(task) => assert_eq!(task.description, "Export_frogs_chunk_0"),
        other => panic!("Expected Submitted, got {:?}", other),
    }
}
