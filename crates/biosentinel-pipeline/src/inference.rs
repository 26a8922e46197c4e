use serde::Serialize;

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{
    BoundingBox, CachedLayer, DateRange, FeatureMatrix, LayerRef, LayerSpec, Point, PredictionRecord,
    SampleTable, POSITION_COVARIATES,
};
use biosentinel_core::ports::{ArtifactStore, ImageryService, RegressionModel};
use biosentinel_geo::generate_grid;
use biosentinel_raster::RasterSampler;
use biosentinel_store::{layer_ref, CacheStats, LayerCache};

use crate::assembler::assemble;

/// Result of one inference run
#[derive(Debug, Clone, Serialize)]
pub struct InferenceOutput {
    pub records: Vec<PredictionRecord>,
    /// Per-layer no-data counts in layer order
    pub no_data: Vec<(String, usize)>,
    /// Hits and fetches for this run's layers
    #[serde(skip)]
    pub cache: CacheStats,
}

/// Grid, cache, sample, predict and assemble over one region
pub struct InferencePipeline<S, R, M>
where
    S: ArtifactStore,
    R: ImageryService,
    M: RegressionModel,
{
    cache: LayerCache<S, R>,
    model: M,
    layers: Vec<LayerSpec>,
    date_range: DateRange,
}

impl<S, R, M> InferencePipeline<S, R, M>
where
    S: ArtifactStore,
    R: ImageryService,
    M: RegressionModel,
{
    pub fn new(cache: LayerCache<S, R>, model: M, layers: Vec<LayerSpec>, date_range: DateRange) -> Self {
        Self { cache, model, layers, date_range }
    }

    /// Feature columns this pipeline produces: layer names, then longitude and latitude
    pub fn feature_columns(&self) -> Vec<String> {
        self.layers
            .iter()
            .map(|l| l.name.clone())
            .chain(POSITION_COVARIATES.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Layer requests for `region`, in layer order
    pub fn layer_refs(&self, region: &BoundingBox) -> Vec<LayerRef> {
        self.layers.iter().map(|spec| layer_ref(region, spec, &self.date_range)).collect()
    }

    pub fn cache(&self) -> &LayerCache<S, R> {
        &self.cache
    }

    /// Fail with `ConfigInvalid` unless the model consumes exactly [`Self::feature_columns`]
    pub fn check_model(&self) -> Result<()> {
        let columns = self.feature_columns();
        if self.model.feature_names() != columns.as_slice() {
            return Err(BioSentinelError::ConfigInvalid {
                key: "layers".to_string(),
                reason: format!(
                    "model expects features {:?}, configured layers produce {:?}",
                    self.model.feature_names(),
                    columns
                ),
            });
        }
        Ok(())
    }

    /// Run the full sampling path over `region` at `resolution` degrees
    pub fn run(&self, region: &BoundingBox, resolution: f64) -> Result<InferenceOutput> {
        self.check_model()?;
        let cached = self.cache.ensure_all(&self.layer_refs(region))?;
        self.run_with_cached(region, resolution, &cached)
    }

    /// Sample, predict and assemble over layers the caller already ensured.
    ///
    /// `cached` must hold one layer per configured layer, in layer order.
    pub fn run_with_cached(
        &self,
        region: &BoundingBox,
        resolution: f64,
        cached: &[CachedLayer],
    ) -> Result<InferenceOutput> {
        self.check_model()?;
        let names: Vec<&str> = cached.iter().map(|c| c.name.as_str()).collect();
        let expected: Vec<&str> = self.layers.iter().map(|l| l.name.as_str()).collect();
        if names != expected {
            return Err(BioSentinelError::ConfigInvalid {
                key: "layers".to_string(),
                reason: format!("cached layers {:?} do not match configured layers {:?}", names, expected),
            });
        }

        // Phase 1: Sampling lattice
        let points = generate_grid(region, resolution)?;

        // Phase 2: Sample
        let sampler = RasterSampler::new(self.cache.store());
        let samples = sampler.sample_layers(&points, cached)?;

        // Phase 3: Predict and join
        let features = feature_matrix(&points, &samples)?;
        let outputs = self.model.predict(&features)?;
        let records = assemble(&points, &samples, &outputs)?;

        let cache = CacheStats::of(cached);
        tracing::info!(
            points = points.len(),
            layers = cached.len(),
            cache_hits = cache.hits,
            cache_fetches = cache.fetches,
            "Inference complete"
        );

        Ok(InferenceOutput { records, no_data: samples.no_data_counts(), cache })
    }
}

/// Model input rows: sampled layer values, then the point's longitude and latitude
pub fn feature_matrix(points: &[Point], samples: &SampleTable) -> Result<FeatureMatrix> {
    if points.len() != samples.len() {
        return Err(BioSentinelError::Alignment {
            points: points.len(),
            samples: samples.len(),
            outputs: points.len(),
        });
    }

    let columns: Vec<String> = samples
        .columns()
        .iter()
        .cloned()
        .chain(POSITION_COVARIATES.iter().map(|c| c.to_string()))
        .collect();

    let mut rows = Vec::with_capacity(points.len());
    for (idx, point) in points.iter().enumerate() {
        let mut row: Vec<Option<f64>> = samples
            .row(idx)
            .unwrap_or_default()
            .iter()
            .map(|v| v.value())
            .collect();
        row.push(Some(point.lon));
        row.push(Some(point.lat));
        rows.push(row);
    }

    Ok(FeatureMatrix { columns, rows })
}
