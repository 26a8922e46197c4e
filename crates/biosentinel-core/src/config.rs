use crate::error::{BioSentinelError, Result};
use crate::models::{BoundingBox, DateRange, LayerSpec, RegionSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default region: Chiribiquete test window
pub const DEFAULT_BBOX: [f64; 4] = [-76.6, 2.6, -76.4, 2.8];

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration consumed by the pipelines
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub region: ConfigValue<RegionSpec>,
    pub resolution: ConfigValue<f64>,
    pub chunk_size: ConfigValue<usize>,
    pub cache_root: ConfigValue<PathBuf>,
    pub date_range: ConfigValue<DateRange>,
    pub remote_url: ConfigValue<String>,
    pub remote_project: ConfigValue<String>,
    pub model_url: ConfigValue<String>,
    pub fetch_timeout_secs: ConfigValue<u64>,
    pub layers: ConfigValue<Vec<LayerSpec>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let [min_lon, min_lat, max_lon, max_lat] = DEFAULT_BBOX;
        let default_dates = DateRange {
            start: chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end: chrono::NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
        };

        Self {
            region: ConfigValue::new(
                RegionSpec::Bounds(BoundingBox { min_lon, max_lon, min_lat, max_lat }),
                ConfigSource::Default,
            ),
            resolution: ConfigValue::new(0.01, ConfigSource::Default),
            chunk_size: ConfigValue::new(2000, ConfigSource::Default),
            cache_root: ConfigValue::new(PathBuf::from("./cached_layers"), ConfigSource::Default),
            date_range: ConfigValue::new(default_dates, ConfigSource::Default),
            remote_url: ConfigValue::new(
                "http://localhost:8600".to_string(),
                ConfigSource::Default,
            ),
            remote_project: ConfigValue::new("biosentinel".to_string(), ConfigSource::Default),
            model_url: ConfigValue::new("http://localhost:8700".to_string(), ConfigSource::Default),
            fetch_timeout_secs: ConfigValue::new(300, ConfigSource::Default),
            layers: ConfigValue::new(LayerSpec::default_catalogue(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| BioSentinelError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| BioSentinelError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(region) = file_config.region {
            validate_region(&region)?;
            self.region.update(region, ConfigSource::File);
        }

        if let Some(resolution) = file_config.resolution {
            self.resolution.update(check_resolution(resolution)?, ConfigSource::File);
        }

        if let Some(chunk_size) = file_config.chunk_size {
            if chunk_size == 0 {
                return Err(BioSentinelError::ConfigInvalid {
                    key: "chunk_size".to_string(),
                    reason: "Chunk size must be a positive integer".to_string(),
                });
            }
            self.chunk_size.update(chunk_size, ConfigSource::File);
        }

        if let Some(cache_root) = file_config.cache_root {
            self.cache_root.update(cache_root, ConfigSource::File);
        }

        if let Some(date_range) = file_config.date_range {
            let validated = DateRange::new(date_range.start, date_range.end)?;
            self.date_range.update(validated, ConfigSource::File);
        }

        if let Some(remote_url) = file_config.remote_url {
            self.remote_url.update(remote_url, ConfigSource::File);
        }

        if let Some(remote_project) = file_config.remote_project {
            self.remote_project.update(remote_project, ConfigSource::File);
        }

        if let Some(model_url) = file_config.model_url {
            self.model_url.update(model_url, ConfigSource::File);
        }

        if let Some(timeout) = file_config.fetch_timeout_secs {
            self.fetch_timeout_secs.update(timeout, ConfigSource::File);
        }

        if let Some(layers) = file_config.layers {
            if layers.is_empty() {
                return Err(BioSentinelError::ConfigInvalid {
                    key: "layers".to_string(),
                    reason: "At least one layer is required".to_string(),
                });
            }
            self.layers.update(layers, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // BIOSENTINEL_BBOX
        if let Ok(bbox_str) = env::var("BIOSENTINEL_BBOX") {
            match BoundingBox::parse(&bbox_str) {
                Ok(bbox) => self.region.update(RegionSpec::Bounds(bbox), ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid BIOSENTINEL_BBOX value '{}': expected min_lon,min_lat,max_lon,max_lat",
                    bbox_str
                ),
            }
        }

        // BIOSENTINEL_RESOLUTION
        if let Ok(res_str) = env::var("BIOSENTINEL_RESOLUTION") {
            match parse_resolution(&res_str) {
                Ok(res) => self.resolution.update(res, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid BIOSENTINEL_RESOLUTION value '{}': expected positive degrees",
                    res_str
                ),
            }
        }

        // BIOSENTINEL_CHUNK_SIZE
        if let Ok(size_str) = env::var("BIOSENTINEL_CHUNK_SIZE") {
            match parse_chunk_size(&size_str) {
                Ok(size) => self.chunk_size.update(size, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid BIOSENTINEL_CHUNK_SIZE value '{}': expected positive integer",
                    size_str
                ),
            }
        }

        // BIOSENTINEL_CACHE_ROOT
        if let Ok(root) = env::var("BIOSENTINEL_CACHE_ROOT") {
            self.cache_root.update(PathBuf::from(root), ConfigSource::Environment);
        }

        // BIOSENTINEL_START_DATE / BIOSENTINEL_END_DATE
        let start = env::var("BIOSENTINEL_START_DATE").ok();
        let end = env::var("BIOSENTINEL_END_DATE").ok();
        if start.is_some() || end.is_some() {
            let current = self.date_range.value;
            let start = start.unwrap_or_else(|| current.start.to_string());
            let end = end.unwrap_or_else(|| current.end.to_string());
            match DateRange::parse(&start, &end) {
                Ok(range) => self.date_range.update(range, ConfigSource::Environment),
                Err(e) => tracing::warn!("Invalid BIOSENTINEL_START_DATE/END_DATE: {}", e),
            }
        }

        // BIOSENTINEL_REMOTE_URL
        if let Ok(url) = env::var("BIOSENTINEL_REMOTE_URL") {
            self.remote_url.update(url, ConfigSource::Environment);
        }

        // BIOSENTINEL_REMOTE_PROJECT
        if let Ok(project) = env::var("BIOSENTINEL_REMOTE_PROJECT") {
            self.remote_project.update(project, ConfigSource::Environment);
        }

        // BIOSENTINEL_MODEL_URL
        if let Ok(url) = env::var("BIOSENTINEL_MODEL_URL") {
            self.model_url.update(url, ConfigSource::Environment);
        }

        // BIOSENTINEL_FETCH_TIMEOUT
        if let Ok(timeout_str) = env::var("BIOSENTINEL_FETCH_TIMEOUT") {
            match timeout_str.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    self.fetch_timeout_secs.update(secs, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid BIOSENTINEL_FETCH_TIMEOUT value '{}': expected seconds > 0",
                    timeout_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(region) = overrides.region {
            self.region.update(region, ConfigSource::Cli);
        }

        if let Some(resolution) = overrides.resolution {
            self.resolution.update(resolution, ConfigSource::Cli);
        }

        if let Some(chunk_size) = overrides.chunk_size {
            self.chunk_size.update(chunk_size, ConfigSource::Cli);
        }

        if let Some(cache_root) = overrides.cache_root {
            self.cache_root.update(cache_root, ConfigSource::Cli);
        }

        if let Some(date_range) = overrides.date_range {
            self.date_range.update(date_range, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        let region = match &self.region.value {
            RegionSpec::Bounds(b) => {
                format!("bbox [{}, {}, {}, {}]", b.min_lon, b.min_lat, b.max_lon, b.max_lat)
            }
            RegionSpec::Around { lon, lat, radius_km } => {
                format!("{} km around ({}, {})", radius_km, lon, lat)
            }
        };
        map.insert("region".to_string(), (region, self.region.source));

        map.insert(
            "resolution".to_string(),
            (format!("{}°", self.resolution.value), self.resolution.source),
        );

        map.insert(
            "chunk_size".to_string(),
            (self.chunk_size.value.to_string(), self.chunk_size.source),
        );

        map.insert(
            "cache_root".to_string(),
            (self.cache_root.value.display().to_string(), self.cache_root.source),
        );

        map.insert(
            "date_range".to_string(),
            (
                format!("{} .. {}", self.date_range.value.start, self.date_range.value.end),
                self.date_range.source,
            ),
        );

        map.insert("remote_url".to_string(), (self.remote_url.value.clone(), self.remote_url.source));

        map.insert(
            "remote_project".to_string(),
            (self.remote_project.value.clone(), self.remote_project.source),
        );

        map.insert("model_url".to_string(), (self.model_url.value.clone(), self.model_url.source));

        map.insert(
            "fetch_timeout_secs".to_string(),
            (self.fetch_timeout_secs.value.to_string(), self.fetch_timeout_secs.source),
        );

        map.insert(
            "layers".to_string(),
            (
                self.layers.value.iter().map(|l| l.name.as_str()).collect::<Vec<_>>().join(", "),
                self.layers.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    region: Option<RegionSpec>,
    resolution: Option<f64>,
    chunk_size: Option<usize>,
    cache_root: Option<PathBuf>,
    date_range: Option<DateRange>,
    remote_url: Option<String>,
    remote_project: Option<String>,
    model_url: Option<String>,
    fetch_timeout_secs: Option<u64>,
    layers: Option<Vec<LayerSpec>>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub region: Option<RegionSpec>,
    pub resolution: Option<f64>,
    pub chunk_size: Option<usize>,
    pub cache_root: Option<PathBuf>,
    pub date_range: Option<DateRange>,
}

/// Parse a grid resolution in degrees
pub fn parse_resolution(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| BioSentinelError::ConfigInvalid {
            key: "resolution".to_string(),
            reason: format!("Invalid resolution '{}': {}", s, e),
        })
        .and_then(check_resolution)
}

fn check_resolution(r: f64) -> Result<f64> {
    if r.is_finite() && r > 0.0 {
        Ok(r)
    } else {
        Err(BioSentinelError::ConfigInvalid {
            key: "resolution".to_string(),
            reason: format!("Invalid resolution: {}. Use a positive number of degrees", r),
        })
    }
}

/// Parse a chunk size
pub fn parse_chunk_size(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(BioSentinelError::ConfigInvalid {
            key: "chunk_size".to_string(),
            reason: format!("Invalid chunk size: {}. Use a positive integer", s),
        }),
    }
}

fn validate_region(region: &RegionSpec) -> Result<()> {
    let invalid = |reason: String| BioSentinelError::ConfigInvalid { key: "region".to_string(), reason };

    match region {
        RegionSpec::Bounds(bbox) => bbox.validate().map_err(|e| invalid(e.to_string())),
        RegionSpec::Around { lon, lat, radius_km } => {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(invalid(format!("Invalid center ({}, {})", lon, lat)));
            }
            if !radius_km.is_finite() || *radius_km <= 0.0 {
                return Err(invalid(format!("Radius must be positive, got {} km", radius_km)));
            }
            Ok(())
        }
    }
}
