//! Imagery service adapter.
//!
//! Endpoints, all `POST` under `{base}/v1/projects/{project}/`:
//! `rasters:fetch` (GeoTIFF bytes), `features:count` (`{"count"}`),
//! `tables:reduce` (`{"table"}`) and `tables:export` (`{"task_id"}`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{
    ExportDescriptor, FeatureCollectionRequest, LayerRef, ReduceSpec, Reducer, TableHandle, TaskId,
};
use biosentinel_core::ports::ImageryService;

use crate::session::RemoteSession;

/// Session with the remote imagery service, scoped to one project
pub struct ImagerySession {
    session: RemoteSession,
    project: String,
}

impl ImagerySession {
    pub fn new(base_url: impl Into<String>, project: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self { session: RemoteSession::new(base_url, timeout)?, project: project.into() })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn session(&self) -> &RemoteSession {
        &self.session
    }

    fn endpoint(&self, method: &str) -> String {
        format!("v1/projects/{}/{}", self.project, method)
    }
}

impl ImageryService for ImagerySession {
    fn fetch_raster(&self, layer: &LayerRef) -> Result<Vec<u8>> {
        let request = FetchRasterRequest::from(layer);
        tracing::debug!(key = %layer.key, dataset = %layer.spec.dataset, "Requesting raster");

        self.session
            .post_bytes(&self.endpoint("rasters:fetch"), &request)
            .map_err(|reason| BioSentinelError::LayerFetch { key: layer.key.to_string(), reason })
    }

    fn count_features(&self, collection: &FeatureCollectionRequest) -> Result<usize> {
        let request = CollectionRequest::from(collection);
        let response: CountResponse = self
            .session
            .post_json(&self.endpoint("features:count"), &request)
            .map_err(|reason| BioSentinelError::remote("count_features", reason))?;
        Ok(response.count)
    }

    fn reduce_over_features(
        &self,
        collection: &FeatureCollectionRequest,
        spec: &ReduceSpec,
    ) -> Result<TableHandle> {
        let request = ReduceRequest::new(collection, spec);
        let response: ReduceResponse = self
            .session
            .post_json(&self.endpoint("tables:reduce"), &request)
            .map_err(|reason| BioSentinelError::remote("reduce_over_features", reason))?;
        Ok(TableHandle(response.table))
    }

    fn export_table_async(
        &self,
        table: &TableHandle,
        destination: &ExportDescriptor,
    ) -> Result<TaskId> {
        let request = ExportRequest { table: &table.0, destination };
        let response: ExportResponse = self
            .session
            .post_json(&self.endpoint("tables:export"), &request)
            .map_err(|reason| BioSentinelError::remote("export_table_async", reason))?;
        Ok(TaskId(response.task_id))
    }
}

/// Request body for `rasters:fetch`
#[derive(Debug, Serialize)]
struct FetchRasterRequest<'a> {
    dataset: &'a str,
    band: &'a str,
    scale: f64,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    region: [f64; 4],
    start_date: String,
    end_date: String,
    format: &'static str,
}

impl<'a> From<&'a LayerRef> for FetchRasterRequest<'a> {
    fn from(layer: &'a LayerRef) -> Self {
        Self {
            dataset: &layer.spec.dataset,
            band: &layer.spec.band,
            scale: layer.spec.scale,
            region: layer.region.to_array(),
            start_date: layer.date_range.start.to_string(),
            end_date: layer.date_range.end.to_string(),
            format: "GEO_TIFF",
        }
    }
}

/// Feature collection plus optional spatial filter
#[derive(Debug, Serialize)]
struct CollectionRequest {
    collection: serde_json::Value,
    filter: Option<serde_json::Value>,
}

impl From<&FeatureCollectionRequest> for CollectionRequest {
    fn from(request: &FeatureCollectionRequest) -> Self {
        Self {
            collection: request.to_geojson(),
            filter: request.filter_region.as_ref().map(|g| g.to_geojson()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BandRequest<'a> {
    name: &'a str,
    dataset: &'a str,
    band: &'a str,
}

/// Request body for `tables:reduce`
#[derive(Debug, Serialize)]
struct ReduceRequest<'a> {
    #[serde(flatten)]
    collection: CollectionRequest,
    bands: Vec<BandRequest<'a>>,
    reducer: Reducer,
    scale: f64,
    tile_scale: u32,
    start_date: String,
    end_date: String,
}

impl<'a> ReduceRequest<'a> {
    fn new(collection: &FeatureCollectionRequest, spec: &'a ReduceSpec) -> Self {
        Self {
            collection: CollectionRequest::from(collection),
            bands: spec
                .bands
                .iter()
                .map(|b| BandRequest { name: &b.name, dataset: &b.dataset, band: &b.band })
                .collect(),
            reducer: spec.reducer,
            scale: spec.scale,
            tile_scale: spec.tile_scale,
            start_date: spec.date_range.start.to_string(),
            end_date: spec.date_range.end.to_string(),
        }
    }
}

/// Request body for `tables:export`
#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    table: &'a str,
    #[serde(flatten)]
    destination: &'a ExportDescriptor,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct ReduceResponse {
    table: String,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    task_id: String,
}
