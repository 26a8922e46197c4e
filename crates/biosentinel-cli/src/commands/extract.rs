//! Extract command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

use biosentinel_core::config::CliConfigOverrides;
use biosentinel_core::models::{
    ChunkOutcome, ExportDescriptor, ExportFormat, FeatureRecord, Geometry, PropertySchema,
    ReduceSpec,
};
use biosentinel_geo::read_feature_collection;
use biosentinel_pipeline::extraction::dataset_name;
use biosentinel_pipeline::{amazon_reference_region, preview, FeatureBatcher};
use biosentinel_remote::ImagerySession;

use crate::cli::ExtractArgs;
use crate::config_loader::load_config;
use crate::dry_run::{display_planned_actions, ActionType, PlannedAction};
use crate::output::OutputWriter;
use crate::output_types::{ExtractOutput, PreviewRow, SubmittedChunk};
use crate::progress::{create_progress_bar, finish_error, finish_success};

pub fn execute(
    args: ExtractArgs,
    config_file: Option<&Path>,
    output: &OutputWriter,
    dry_run: bool,
) -> Result<()> {
    let overrides = CliConfigOverrides { chunk_size: args.chunk_size, ..Default::default() };
    let config = load_config(config_file, overrides)?;
    let chunk_size = config.chunk_size.value;

    let name = args.name.clone().unwrap_or_else(|| dataset_name(&args.path));
    let content = fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let region = if args.no_filter { None } else { Some(amazon_reference_region()) };

    if dry_run {
        let records = read_feature_collection(&content, &PropertySchema::training())
            .with_context(|| format!("Failed to parse {}", args.path.display()))?;
        return plan(&name, &records, chunk_size, region.as_ref(), &args.folder, output);
    }

    let timeout = Duration::from_secs(config.fetch_timeout_secs.value);
    let imagery = ImagerySession::new(&config.remote_url.value, &config.remote_project.value, timeout)?;
    let batcher = FeatureBatcher::new(&imagery, ReduceSpec::training(config.date_range.value))
        .with_filter_region(region);

    let records = read_feature_collection(&content, batcher.schema())
        .with_context(|| format!("Failed to parse {}", args.path.display()))?;
    let chunks = batcher.partition(&records, chunk_size)?;

    let pb = create_progress_bar(chunks.len() as u64, &format!("Submitting {}", name), output.is_json());
    let mut submitted = Vec::new();
    let mut skipped = Vec::new();

    for chunk in &chunks {
        let descriptor = ExportDescriptor::for_chunk(&name, chunk.index, &args.folder, ExportFormat::Csv);
        match batcher.submit(chunk, &descriptor) {
            Ok(ChunkOutcome::Submitted(task)) => submitted.push(SubmittedChunk {
                chunk_index: task.chunk_index,
                task_id: task.task_id.to_string(),
                description: task.description,
                features: task.feature_count,
            }),
            Ok(ChunkOutcome::Empty { chunk_index }) => skipped.push(chunk_index),
            Err(e) => {
                finish_error(&pb, &format!("Chunk {} failed", chunk.index));
                return Err(e).with_context(|| format!("Failed to submit {}", descriptor.description));
            }
        }
        pb.inc(1);
    }
    finish_success(&pb, &format!("{} submitted, {} skipped", submitted.len(), skipped.len()));

    if output.is_json() {
        return output.result(ExtractOutput { dataset: name, records: records.len(), submitted, skipped });
    }

    output.section(format!("Extraction: {}", name));
    output.kv("Records", records.len());
    output.kv("Chunks", chunks.len());
    output.table(submitted);
    for chunk_index in skipped {
        output.warning(format!("Chunk {} has no features inside the reference region, skipped", chunk_index));
    }
    output.info("Exports run remotely; track them with the remote task manager");
    Ok(())
}

fn plan(
    name: &str,
    records: &[FeatureRecord],
    chunk_size: usize,
    region: Option<&Geometry>,
    folder: &str,
    output: &OutputWriter,
) -> Result<()> {
    let previews = preview(records, chunk_size, region)?;

    let actions: Vec<PlannedAction> = previews
        .iter()
        .map(|p| {
            let descriptor = ExportDescriptor::for_chunk(name, p.chunk_index, folder, ExportFormat::Csv);
            let action = if p.in_region == 0 {
                PlannedAction::new(ActionType::SkipChunk, format!("Skip {}", descriptor.file_name_prefix))
            } else {
                PlannedAction::new(ActionType::SubmitChunk, descriptor.description.clone())
                    .with_detail(format!("Destination: {}/{}", descriptor.folder, descriptor.file_name_prefix))
            };
            action
                .with_detail(format!("Records: {}", p.records))
                .with_detail(format!("In region (local estimate): {}", p.in_region))
        })
        .collect();

    display_planned_actions(output, &actions)?;
    output.table(previews.iter().map(PreviewRow::from).collect());
    Ok(())
}
