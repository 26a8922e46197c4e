pub mod export;
pub mod feature;
pub mod geometry;
pub mod layer;
pub mod prediction;
pub mod region;
pub mod sample;

pub use export::{
    ChunkOutcome, ExportDescriptor, ExportFormat, ExportTask, FeatureCollectionRequest, ReduceSpec,
    Reducer, TableHandle, TaskId,
};
pub use feature::{
    FeatureRecord, Properties, PropertySchema, PropertyValue, UnknownKeyPolicy,
    POSITION_COVARIATES, TRAINING_TARGETS,
};
pub use geometry::{Geometry, GeometryType, Ring};
pub use layer::{CacheOutcome, CachedLayer, LayerRef, LayerSpec, StorageKey, DEFAULT_LAYER_SCALE};
pub use prediction::{FeatureMatrix, OutputMatrix, PredictionRecord};
pub use region::{BoundingBox, DateRange, GridSpec, Point, RegionSpec};
pub use sample::{SampleTable, SampleValue};
