//! BioSentinel Pipeline - Orchestration of the sampling and extraction paths
//!
//! The inference path turns a region into geo-referenced predictions:
//! grid, cache, sample, predict, assemble. The extraction path batches
//! repaired training polygons and submits them for remote reduction and
//! export, and [`training`] cleans the exported tables afterwards.

pub mod assembler;
pub mod batcher;
pub mod extraction;
pub mod inference;
pub mod output;
pub mod training;

pub use assembler::assemble;
pub use batcher::{amazon_reference_region, FeatureBatcher, AMAZON_REFERENCE_BBOX, DEFAULT_EXPORT_FOLDER};
pub use extraction::{extract, preview, ChunkPreview, ExtractionReport, ExtractionRequest};
pub use inference::{feature_matrix, InferenceOutput, InferencePipeline};
pub use output::{to_feature_collection, write_geojson};
pub use training::{prepare_directory, prepare_file, prepare_training_table, TrainingTable};
