//! BioSentinel Store - Artifact storage and the layer cache
//!
//! This crate provides artifact store adapters (filesystem and in-memory),
//! fingerprinted storage keys, and the download-if-missing layer cache.

pub mod cache;
pub mod fs;
pub mod key;
pub mod memory;

pub use cache::{CacheStats, LayerCache};
pub use fs::FsArtifactStore;
pub use key::{fingerprint, layer_ref, storage_key};
pub use memory::MemoryArtifactStore;
