//! Predict command implementation

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use biosentinel_core::config::{CliConfigOverrides, LayeredConfig};
use biosentinel_core::models::{BoundingBox, GridSpec, POSITION_COVARIATES, TRAINING_TARGETS};
use biosentinel_core::ports::ArtifactStore;
use biosentinel_geo::{grid_dimensions, resolve_region};
use biosentinel_pipeline::{write_geojson, InferencePipeline};
use biosentinel_remote::{HttpRegressionModel, ImagerySession};
use biosentinel_store::{layer_ref, CacheStats, FsArtifactStore, LayerCache};

use crate::cli::PredictArgs;
use crate::config_loader::load_config;
use crate::dry_run::{display_planned_actions, ActionType, PlannedAction};
use crate::output::OutputWriter;
use crate::output_types::{LayerRow, PredictOutput};
use crate::progress::{create_progress_bar, create_spinner, finish_error, finish_success};

pub fn execute(
    args: PredictArgs,
    config_file: Option<&Path>,
    output: &OutputWriter,
    dry_run: bool,
) -> Result<()> {
    let overrides = CliConfigOverrides {
        region: args.region.to_region()?,
        resolution: args.resolution,
        cache_root: args.cache_root.clone(),
        ..Default::default()
    };
    let config = load_config(config_file, overrides)?;

    let bbox = resolve_region(&config.region.value)?;
    let resolution = config.resolution.value;
    let store = FsArtifactStore::new(config.cache_root.value.clone());

    if dry_run {
        return plan(&config, &bbox, &store, &args.output, output);
    }

    let timeout = Duration::from_secs(config.fetch_timeout_secs.value);
    let imagery = ImagerySession::new(&config.remote_url.value, &config.remote_project.value, timeout)?;

    let layers = config.layers.value.clone();
    let feature_names: Vec<String> = layers
        .iter()
        .map(|l| l.name.clone())
        .chain(POSITION_COVARIATES.iter().map(|c| c.to_string()))
        .collect();
    let output_names: Vec<String> = TRAINING_TARGETS.iter().map(|t| t.to_string()).collect();
    let model = HttpRegressionModel::new(&config.model_url.value, feature_names, output_names, timeout)?;

    let pipeline = InferencePipeline::new(
        LayerCache::new(store, imagery),
        model,
        layers,
        config.date_range.value,
    );

    pipeline.check_model().context("Model does not match the configured layers")?;

    // Phase 1: cache layers one at a time
    let refs = pipeline.layer_refs(&bbox);
    let pb = create_progress_bar(refs.len() as u64, "Caching layers", output.is_json());
    let mut cached = Vec::with_capacity(refs.len());
    for layer in &refs {
        pb.set_message(format!("Caching {}", layer.spec.name));
        match pipeline.cache().ensure(layer) {
            Ok(ready) => cached.push(ready),
            Err(e) => {
                finish_error(&pb, &format!("Failed to cache {}", layer.spec.name));
                return Err(e).context("Layer caching failed");
            }
        }
        pb.inc(1);
    }
    let fetched = CacheStats::of(&cached).fetches;
    finish_success(&pb, &format!("{} layers ready ({} fetched)", cached.len(), fetched));

    // Phase 2: sample, predict and assemble over the layers just ensured
    let spinner = create_spinner("Sampling and predicting...", output.is_json());
    let result = match pipeline.run_with_cached(&bbox, resolution, &cached) {
        Ok(result) => {
            finish_success(&spinner, &format!("Predicted {} points", result.records.len()));
            result
        }
        Err(e) => {
            finish_error(&spinner, "Inference failed");
            return Err(e).context("Inference failed");
        }
    };

    write_geojson(&args.output, &result.records)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if output.is_json() {
        return output.result(PredictOutput {
            output: args.output.display().to_string(),
            points: result.records.len(),
            cache_hits: result.cache.hits,
            cache_fetches: result.cache.fetches,
            no_data: result.no_data,
        });
    }

    output.section("Prediction");
    output.kv("Points", result.records.len());
    output.kv("Layers fetched", result.cache.fetches);
    output.kv("Layers reused", result.cache.hits);
    output.table(
        result
            .no_data
            .into_iter()
            .map(|(name, no_data)| LayerRow { name, no_data })
            .collect(),
    );
    output.success(format!("Wrote {}", args.output.display()));
    Ok(())
}

fn plan(
    config: &LayeredConfig,
    bbox: &BoundingBox,
    store: &FsArtifactStore,
    destination: &Path,
    output: &OutputWriter,
) -> Result<()> {
    let spec = GridSpec::new(*bbox, config.resolution.value)?;
    let (columns, rows) = grid_dimensions(&spec);

    let mut actions = Vec::new();
    for layer in &config.layers.value {
        let reference = layer_ref(bbox, layer, &config.date_range.value);
        let location = store.locate(&reference.key);
        let action = if store.exists(&reference.key)? {
            PlannedAction::new(ActionType::ReuseLayer, format!("Reuse cached {}", layer.name))
        } else {
            PlannedAction::new(ActionType::FetchLayer, format!("Fetch {}", layer.name))
                .with_detail(format!("Dataset: {}", layer.dataset))
                .with_detail(format!("Band: {}", layer.band))
                .with_detail(format!("Scale: {} m", layer.scale))
        };
        actions.push(action.with_detail(format!("Location: {}", location)));
    }

    actions.push(
        PlannedAction::new(ActionType::Predict, format!("Predict {} points", columns.saturating_mul(rows)))
            .with_detail(format!("Lattice: {} x {} at {}°", columns, rows, spec.resolution))
            .with_detail(format!("Model: {}", config.model_url.value)),
    );
    actions.push(PlannedAction::new(
        ActionType::WriteFile,
        format!("Write {}", destination.display()),
    ));

    display_planned_actions(output, &actions)
}
