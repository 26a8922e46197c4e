//! Download-if-missing layer cache.
//!
//! Existence of an artifact at the layer's storage key is the only cache-hit
//! signal. Two processes racing on the same missing key may both fetch; the
//! atomic write means the loser overwrites a complete artifact with another
//! complete artifact.

use std::sync::atomic::{AtomicUsize, Ordering};

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{CacheOutcome, CachedLayer, LayerRef};
use biosentinel_core::ports::{ArtifactStore, ImageryService};

/// Hit and fetch counts of one cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub fetches: usize,
}

impl CacheStats {
    /// Counts over the outcomes of a set of ensured layers
    pub fn of(layers: &[CachedLayer]) -> Self {
        layers.iter().fold(Self::default(), |mut stats, layer| {
            match layer.outcome {
                CacheOutcome::Hit => stats.hits += 1,
                CacheOutcome::Fetched => stats.fetches += 1,
            }
            stats
        })
    }
}

/// Layer cache over an artifact store and the remote imagery service
pub struct LayerCache<S: ArtifactStore, R: ImageryService> {
    store: S,
    remote: R,
    hits: AtomicUsize,
    fetches: AtomicUsize,
}

impl<S: ArtifactStore, R: ImageryService> LayerCache<S, R> {
    pub fn new(store: S, remote: R) -> Self {
        Self { store, remote, hits: AtomicUsize::new(0), fetches: AtomicUsize::new(0) }
    }

    /// Make sure the artifact for `layer` is in the store, fetching it at most once
    pub fn ensure(&self, layer: &LayerRef) -> Result<CachedLayer> {
        let location = self.store.locate(&layer.key);

        if self.store.exists(&layer.key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::info!(layer = %layer.spec.name, location = %location, "Layer cache hit");
            return Ok(self.cached(layer, location, CacheOutcome::Hit));
        }

        tracing::info!(
            layer = %layer.spec.name,
            dataset = %layer.spec.dataset,
            band = %layer.spec.band,
            scale = layer.spec.scale,
            "Layer missing from cache, fetching"
        );

        let bytes = self.remote.fetch_raster(layer).map_err(|e| match e {
            BioSentinelError::LayerFetch { .. } => e,
            other => BioSentinelError::LayerFetch {
                key: layer.key.to_string(),
                reason: other.to_string(),
            },
        })?;

        if bytes.is_empty() {
            return Err(BioSentinelError::LayerFetch {
                key: layer.key.to_string(),
                reason: "remote service returned an empty artifact".to_string(),
            });
        }

        self.store.write_atomic(&layer.key, &bytes)?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::info!(layer = %layer.spec.name, bytes = bytes.len(), location = %location, "Layer cached");

        Ok(self.cached(layer, location, CacheOutcome::Fetched))
    }

    /// Ensure every layer in order, stopping at the first failure
    pub fn ensure_all(&self, layers: &[LayerRef]) -> Result<Vec<CachedLayer>> {
        layers.iter().map(|layer| self.ensure(layer)).collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn cached(&self, layer: &LayerRef, location: String, outcome: CacheOutcome) -> CachedLayer {
        CachedLayer { name: layer.spec.name.clone(), key: layer.key.clone(), location, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::layer_ref;
    use crate::memory::MemoryArtifactStore;
    use biosentinel_core::models::{
        BoundingBox, DateRange, ExportDescriptor, FeatureCollectionRequest, LayerSpec, ReduceSpec,
        TableHandle, TaskId,
    };

    struct StaticRemote(Vec<u8>);

    impl ImageryService for StaticRemote {
        fn fetch_raster(&self, _layer: &LayerRef) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn count_features(&self, _collection: &FeatureCollectionRequest) -> Result<usize> {
            unimplemented!("not used by the cache")
        }

        fn reduce_over_features(
            &self,
            _collection: &FeatureCollectionRequest,
            _spec: &ReduceSpec,
        ) -> Result<TableHandle> {
            unimplemented!("not used by the cache")
        }

        fn export_table_async(
            &self,
            _table: &TableHandle,
            _destination: &ExportDescriptor,
        ) -> Result<TaskId> {
            unimplemented!("not used by the cache")
        }
    }

    fn ndvi_ref() -> LayerRef {
        layer_ref(
            &BoundingBox::new(-76.6, 2.6, -76.4, 2.8).unwrap(),
            &LayerSpec::new("NDVI", "COPERNICUS/S2_SR_HARMONIZED", "NDVI", 1000.0),
            &DateRange::parse("2023-01-01", "2023-12-31").unwrap(),
        )
    }

    #[test]
    fn test_hit_then_stats() {
        let store = MemoryArtifactStore::new();
        let cache = LayerCache::new(store.clone(), StaticRemote(vec![1, 2, 3]));

        let first = cache.ensure(&ndvi_ref()).unwrap();
        let second = cache.ensure(&ndvi_ref()).unwrap();

        assert_eq!(first.outcome, CacheOutcome::Fetched);
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(first.key, second.key);
        assert_eq!(cache.stats(), CacheStats { hits: 1, fetches: 1 });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stats_of_outcomes_count_one_pass() {
        let cache = LayerCache::new(MemoryArtifactStore::new(), StaticRemote(vec![1]));
        let cold = vec![cache.ensure(&ndvi_ref()).unwrap()];
        let warm = vec![cache.ensure(&ndvi_ref()).unwrap()];

        assert_eq!(CacheStats::of(&cold), CacheStats { hits: 0, fetches: 1 });
        assert_eq!(CacheStats::of(&warm), CacheStats { hits: 1, fetches: 0 });
        assert_eq!(cache.stats(), CacheStats { hits: 1, fetches: 1 });
    }

    #[test]
    fn test_empty_artifact_is_fetch_error() {
        let store = MemoryArtifactStore::new();
        let cache = LayerCache::new(&store, StaticRemote(Vec::new()));

        assert!(matches!(cache.ensure(&ndvi_ref()), Err(BioSentinelError::LayerFetch { .. })));
        assert!(store.is_empty());
    }
}
