use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{CachedLayer, Point, SampleTable, SampleValue};
use biosentinel_core::ports::ArtifactStore;

use crate::geotiff::Raster;

/// Samples cached layer artifacts at lattice points
pub struct RasterSampler<S: ArtifactStore> {
    store: S,
}

impl<S: ArtifactStore> RasterSampler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read and decode the artifact behind `layer`
    pub fn load(&self, layer: &CachedLayer) -> Result<Raster> {
        let bytes = self
            .store
            .read(&layer.key)?
            .ok_or_else(|| BioSentinelError::LayerMissing { key: layer.key.to_string() })?;
        Raster::decode(&bytes, &layer.key)
    }

    /// One value per point, in point order
    pub fn sample(&self, points: &[Point], layer: &CachedLayer) -> Result<Vec<SampleValue>> {
        let raster = self.load(layer)?;
        let values: Vec<SampleValue> = points.iter().map(|p| raster.value_at(p)).collect();

        let no_data = values.iter().filter(|v| v.is_no_data()).count();
        tracing::debug!(layer = %layer.name, points = points.len(), no_data, "Sampled layer");

        Ok(values)
    }

    /// Sample every layer and concatenate the results column-wise
    pub fn sample_layers(&self, points: &[Point], layers: &[CachedLayer]) -> Result<SampleTable> {
        let mut table = SampleTable::new(points.len());
        for layer in layers {
            table.push_column(layer.name.clone(), self.sample(points, layer)?)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosentinel_core::models::{BoundingBox, CacheOutcome, StorageKey};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore {
        artifacts: RefCell<HashMap<StorageKey, Vec<u8>>>,
    }

    impl ArtifactStore for MapStore {
        fn exists(&self, key: &StorageKey) -> Result<bool> {
            Ok(self.artifacts.borrow().contains_key(key))
        }

        fn read(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
            Ok(self.artifacts.borrow().get(key).cloned())
        }

        fn write_atomic(&self, key: &StorageKey, bytes: &[u8]) -> Result<()> {
            self.artifacts.borrow_mut().insert(key.clone(), bytes.to_vec());
            Ok(())
        }

        fn locate(&self, key: &StorageKey) -> String {
            format!("map://{}", key)
        }
    }

    fn cached(store: &MapStore, name: &str, pixels: Vec<f64>) -> CachedLayer {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0).unwrap();
        let raster = Raster::from_bounds(&bbox, 2, 2, pixels, Some(-1.0)).unwrap();
        let key = StorageKey(format!("{}.tif", name));
        store.write_atomic(&key, &raster.to_geotiff_bytes().unwrap()).unwrap();

        CachedLayer {
            name: name.to_string(),
            location: store.locate(&key),
            key,
            outcome: CacheOutcome::Fetched,
        }
    }

    #[test]
    fn test_sample_preserves_point_order() {
        let store = MapStore::default();
        let layer = cached(&store, "DEM", vec![10.0, 20.0, 30.0, 40.0]);
        let sampler = RasterSampler::new(&store);

        let points = vec![Point::new(1.5, 0.5), Point::new(0.5, 1.5), Point::new(1.5, 1.5)];
        let values = sampler.sample(&points, &layer).unwrap();

        assert_eq!(
            values,
            vec![SampleValue::Value(40.0), SampleValue::Value(10.0), SampleValue::Value(20.0)]
        );
    }

    #[test]
    fn test_point_outside_raster_is_no_data() {
        let store = MapStore::default();
        let layer = cached(&store, "NDVI", vec![0.1, 0.2, 0.3, 0.4]);
        let sampler = RasterSampler::new(&store);

        let values = sampler.sample(&[Point::new(-76.5, 2.6), Point::new(2.5, 1.0)], &layer).unwrap();
        assert_eq!(values, vec![SampleValue::NoData, SampleValue::NoData]);
    }

    #[test]
    fn test_missing_artifact_is_layer_missing() {
        let store = MapStore::default();
        let sampler = RasterSampler::new(&store);
        let layer = CachedLayer {
            name: "NDVI".to_string(),
            key: StorageKey("NDVI_absent.tif".to_string()),
            location: "map://NDVI_absent.tif".to_string(),
            outcome: CacheOutcome::Hit,
        };

        match sampler.sample(&[Point::new(0.5, 0.5)], &layer) {
            Err(BioSentinelError::LayerMissing { key }) => assert_eq!(key, "NDVI_absent.tif"),
            other => panic!("Expected LayerMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_layers_builds_aligned_table() {
        let store = MapStore::default();
        let ndvi = cached(&store, "NDVI", vec![0.1, 0.2, 0.3, -1.0]);
        let dem = cached(&store, "DEM", vec![100.0, 200.0, 300.0, 400.0]);
        let sampler = RasterSampler::new(&store);

        let points = vec![Point::new(0.5, 1.5), Point::new(1.5, 0.5)];
        let table = sampler.sample_layers(&points, &[ndvi, dem]).unwrap();

        assert_eq!(table.columns(), &["NDVI".to_string(), "DEM".to_string()]);
        assert_eq!(table.row(0).unwrap(), vec![SampleValue::Value(0.1), SampleValue::Value(100.0)]);
        assert_eq!(table.row(1).unwrap(), vec![SampleValue::NoData, SampleValue::Value(400.0)]);
    }
}
