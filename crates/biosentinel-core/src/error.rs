//! Error types for BioSentinel

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BioSentinelError {
    // Grid errors
    #[error("Invalid grid specification: {reason}")]
    InvalidGridSpec { reason: String },

    // Layer cache errors
    #[error("Failed to fetch layer {key}: {reason}")]
    LayerFetch { key: String, reason: String },

    #[error("Layer artifact missing at {key}. Layers must be ensured through the cache before sampling")]
    LayerMissing { key: String },

    #[error("Failed to decode raster {key}: {reason}")]
    RasterDecode { key: String, reason: String },

    // Geometry errors
    #[error("Unsupported geometry type '{kind}' (expected Polygon or MultiPolygon)")]
    UnsupportedGeometry { kind: String },

    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    #[error("Property '{key}' rejected on record {record}: {reason}")]
    PropertyRejected {
        record: u64,
        key: String,
        reason: String,
    },

    // Batching errors
    #[error("Invalid chunk size {size}: must be greater than zero")]
    InvalidChunkSize { size: usize },

    // Assembly errors
    #[error("Alignment mismatch: {points} points, {samples} sample rows, {outputs} model outputs")]
    Alignment {
        points: usize,
        samples: usize,
        outputs: usize,
    },

    // Remote collaborator errors
    #[error("Remote service error during {operation}: {reason}")]
    RemoteService { operation: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BioSentinelError {
    /// Shorthand for a remote failure surfaced unchanged from a collaborator
    pub fn remote(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::RemoteService { operation: operation.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, BioSentinelError>;
