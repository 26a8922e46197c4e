use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use biosentinel_core::config::{parse_chunk_size, parse_resolution};
use biosentinel_core::models::{BoundingBox, RegionSpec};
use biosentinel_pipeline::DEFAULT_EXPORT_FOLDER;

/// BioSentinel - Grid sampling and polygon batching for species-distribution inference
#[derive(Parser, Debug)]
#[command(name = "biosentinel")]
#[command(about = "Grid sampling and polygon batching for species-distribution inference", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./biosentinel.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the sampling lattice for a region
    Grid(GridArgs),

    /// Sample cached layers over a region and predict with the remote model
    Predict(PredictArgs),

    /// Submit a polygon dataset for chunked remote extraction
    Extract(ExtractArgs),

    /// Clean exported statistics tables into training tables
    Prepare(PrepareArgs),

    /// Show the layered configuration and where each value comes from
    Config,
}

/// Region selection shared by `grid` and `predict`
#[derive(Args, Debug, Default)]
pub struct RegionArgs {
    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_name = "BBOX", allow_hyphen_values = true, conflicts_with = "center")]
    pub bbox: Option<String>,

    /// Center point as lon,lat (requires --radius-km)
    #[arg(long, value_name = "LON,LAT", allow_hyphen_values = true, requires = "radius_km")]
    pub center: Option<String>,

    /// Half-side of the square around --center, in kilometers
    #[arg(long, requires = "center")]
    pub radius_km: Option<f64>,
}

impl RegionArgs {
    /// Region override, `None` when no region flag was given
    pub fn to_region(&self) -> anyhow::Result<Option<RegionSpec>> {
        if let Some(bbox) = &self.bbox {
            return Ok(Some(RegionSpec::Bounds(BoundingBox::parse(bbox)?)));
        }

        match (&self.center, self.radius_km) {
            (Some(center), Some(radius_km)) => {
                let parts: Vec<f64> = center
                    .split(',')
                    .map(|p| p.trim().parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| anyhow::anyhow!("Invalid center '{}': {}", center, e))?;
                match parts.as_slice() {
                    [lon, lat] => Ok(Some(RegionSpec::Around { lon: *lon, lat: *lat, radius_km })),
                    _ => anyhow::bail!("Invalid center '{}': expected lon,lat", center),
                }
            }
            _ => Ok(None),
        }
    }
}

#[derive(Parser, Debug)]
pub struct GridArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Grid spacing in degrees
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<f64>,

    /// Print only the lattice size
    #[arg(long)]
    pub count_only: bool,
}

#[derive(Parser, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Grid spacing in degrees
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<f64>,

    /// Output GeoJSON file
    #[arg(long, short = 'o', default_value = "predictions.geojson")]
    pub output: PathBuf,

    /// Directory holding cached layer artifacts
    #[arg(long)]
    pub cache_root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// GeoJSON file of training polygons
    pub path: PathBuf,

    /// Maximum features per chunk
    #[arg(long, value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Dataset name used in export names (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Destination folder for exports
    #[arg(long, default_value = DEFAULT_EXPORT_FOLDER)]
    pub folder: String,

    /// Submit chunks without filtering to the Amazon reference region
    #[arg(long)]
    pub no_filter: bool,
}

#[derive(Parser, Debug)]
pub struct PrepareArgs {
    /// Exported CSV file, or a directory of them
    pub path: PathBuf,

    /// Output CSV file, or a directory when PATH is a directory
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}
