//! BioSentinel Geo - Sampling lattices, geometry repair, and spatial operations
//!
//! This crate holds the pure geometry of the pipelines: region and grid
//! generation, ring repair of raw polygonal input, conversions to the `geo`
//! crate, and local spatial predicates.

pub mod collection;
pub mod grid;
pub mod models;
pub mod repair;
pub mod spatial;

pub use collection::read_feature_collection;
pub use grid::{bbox_from_point, generate_grid, grid_dimensions, resolve_region, KM_PER_DEGREE};
pub use repair::{close_ring, repair, repair_feature, repair_value};
