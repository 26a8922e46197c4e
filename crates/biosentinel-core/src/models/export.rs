//! Types exchanged with the remote extraction/export service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::feature::FeatureRecord;
use crate::models::geometry::Geometry;
use crate::models::layer::LayerSpec;
use crate::models::region::DateRange;

/// Feature collection to be built remotely, optionally filtered to a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollectionRequest {
    pub features: Vec<FeatureRecord>,
    /// Keep only features intersecting this geometry
    pub filter_region: Option<Geometry>,
}

impl FeatureCollectionRequest {
    pub fn new(features: Vec<FeatureRecord>, filter_region: Option<Geometry>) -> Self {
        Self { features, filter_region }
    }

    /// GeoJSON FeatureCollection of the (unfiltered) features
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": self.features.iter().map(FeatureRecord::to_geojson).collect::<Vec<_>>(),
        })
    }
}

/// Per-feature reducer applied over an image stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    #[default]
    Mean,
}

/// Reduction request: which bands, how to reduce, at what scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceSpec {
    pub bands: Vec<LayerSpec>,
    pub date_range: DateRange,
    pub reducer: Reducer,
    /// Scale in meters
    pub scale: f64,
    pub tile_scale: u32,
}

impl ReduceSpec {
    /// Image stack used for training extraction: NDVI, DEM, raw MODIS LST and SMAP soil moisture
    pub fn training(date_range: DateRange) -> Self {
        Self {
            bands: vec![
                LayerSpec::new("NDVI", "COPERNICUS/S2_SR_HARMONIZED", "NDVI", 5000.0),
                LayerSpec::new("DEM", "COPERNICUS/DEM/GLO30", "DEM", 5000.0),
                LayerSpec::new("LST_Day_1km", "MODIS/061/MOD11A2", "LST_Day_1km", 5000.0),
                LayerSpec::new("ssm", "NASA_USDA/HSL/SMAP10KM_soil_moisture", "ssm", 5000.0),
            ],
            date_range,
            reducer: Reducer::Mean,
            scale: 5000.0,
            tile_scale: 4,
        }
    }
}

/// Opaque reference to a remotely computed statistics table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableHandle(pub String);

/// Remote task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    GeoJson,
}

/// Where and how the remote service should write an exported table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDescriptor {
    pub description: String,
    pub folder: String,
    pub file_name_prefix: String,
    pub file_format: ExportFormat,
}

impl ExportDescriptor {
    /// Descriptor for chunk `index` of dataset `base_name`
    pub fn for_chunk(base_name: &str, index: usize, folder: &str, file_format: ExportFormat) -> Self {
        let name = format!("{}_chunk_{}", base_name, index);
        Self {
            description: format!("Export_{}", name),
            folder: folder.to_string(),
            file_name_prefix: name,
            file_format,
        }
    }
}

/// Accepted remote export. Completion is observed out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    pub chunk_index: usize,
    pub task_id: TaskId,
    pub description: String,
    pub feature_count: usize,
    pub submitted_at: DateTime<Utc>,
}

/// Result of submitting one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChunkOutcome {
    Submitted(ExportTask),
    /// The filtered collection held no features; nothing was exported
    Empty { chunk_index: usize },
}
