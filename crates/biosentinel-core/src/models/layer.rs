use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::region::{BoundingBox, DateRange};

/// Default sampling scale for cached layers, in meters
pub const DEFAULT_LAYER_SCALE: f64 = 1000.0;

/// One raster variable requested from the imagery service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Column name in sample tables (e.g. "LST_C")
    pub name: String,

    /// Logical dataset name understood by the imagery service
    pub dataset: String,

    /// Band to select from the dataset composite
    pub band: String,

    /// Sampling scale in meters
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    DEFAULT_LAYER_SCALE
}

impl LayerSpec {
    pub fn new(
        name: impl Into<String>,
        dataset: impl Into<String>,
        band: impl Into<String>,
        scale: f64,
    ) -> Self {
        Self { name: name.into(), dataset: dataset.into(), band: band.into(), scale }
    }

    /// NDVI, land-surface temperature and elevation
    pub fn default_catalogue() -> Vec<LayerSpec> {
        vec![
            LayerSpec::new("NDVI", "COPERNICUS/S2_SR_HARMONIZED", "NDVI", DEFAULT_LAYER_SCALE),
            LayerSpec::new("LST_C", "MODIS/061/MOD11A2", "LST", DEFAULT_LAYER_SCALE),
            LayerSpec::new("DEM", "COPERNICUS/DEM/GLO30", "DEM", DEFAULT_LAYER_SCALE),
        ]
    }
}

/// Relative storage key of a cached artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey(pub String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully resolved raster layer request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRef {
    pub region: BoundingBox,
    pub spec: LayerSpec,
    pub date_range: DateRange,
    pub key: StorageKey,
}

/// Whether `ensure` found the artifact or had to fetch it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    Hit,
    Fetched,
}

/// Handle to a layer artifact present in durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLayer {
    pub name: String,
    pub key: StorageKey,
    /// Human-readable location (file path or store URI)
    pub location: String,
    pub outcome: CacheOutcome,
}
