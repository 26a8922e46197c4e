//! Grid command implementation

use anyhow::Result;
use std::path::Path;

use biosentinel_core::config::CliConfigOverrides;
use biosentinel_core::models::GridSpec;
use biosentinel_geo::{generate_grid, grid_dimensions, resolve_region};

use crate::cli::GridArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{GridOutput, PointRow};

pub fn execute(args: GridArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let overrides = CliConfigOverrides {
        region: args.region.to_region()?,
        resolution: args.resolution,
        ..Default::default()
    };
    let config = load_config(config_file, overrides)?;

    let bbox = resolve_region(&config.region.value)?;
    let spec = GridSpec::new(bbox, config.resolution.value)?;
    let (columns, rows) = grid_dimensions(&spec);

    let points = if args.count_only { None } else { Some(generate_grid(&bbox, spec.resolution)?) };
    let count = points.as_ref().map_or(columns.saturating_mul(rows), Vec::len);

    if output.is_json() {
        return output.result(GridOutput {
            bbox,
            resolution: spec.resolution,
            columns,
            rows,
            count,
            points,
        });
    }

    output.section("Sampling Lattice");
    output.kv(
        "Region",
        format!("[{}, {}] x [{}, {}]", bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat),
    );
    output.kv("Resolution", format!("{}°", spec.resolution));
    output.kv("Dimensions", format!("{} x {}", columns, rows));
    output.kv("Points", count);

    if let Some(points) = points {
        output.table(
            points
                .iter()
                .enumerate()
                .map(|(index, p)| PointRow { index, lon: p.lon, lat: p.lat })
                .collect(),
        );
    }

    Ok(())
}
