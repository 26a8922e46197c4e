//! BioSentinel Raster - GeoTIFF decoding and point sampling
//!
//! Cached layer artifacts are single-band, north-up GeoTIFFs in geographic
//! degrees. This crate decodes them and samples them at lattice points.

pub mod geotiff;
pub mod sampler;

pub use geotiff::Raster;
pub use sampler::RasterSampler;
