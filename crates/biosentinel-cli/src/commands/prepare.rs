//! Prepare command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use biosentinel_pipeline::{prepare_directory, prepare_file};

use crate::cli::PrepareArgs;
use crate::dry_run::{display_planned_actions, ActionType, PlannedAction};
use crate::output::OutputWriter;
use crate::output_types::PreparedOutput;

pub fn execute(args: PrepareArgs, output: &OutputWriter, dry_run: bool) -> Result<()> {
    if dry_run {
        let actions: Vec<PlannedAction> = planned_outputs(&args)?
            .into_iter()
            .map(|(input, target)| {
                PlannedAction::new(ActionType::WriteFile, format!("Write {}", target.display()))
                    .with_detail(format!("From: {}", input.display()))
            })
            .collect();
        return display_planned_actions(output, &actions);
    }

    let prepared: Vec<PreparedOutput> = if args.path.is_dir() {
        prepare_directory(&args.path, &args.output)
            .with_context(|| format!("Failed to prepare {}", args.path.display()))?
            .into_iter()
            .map(|p| PreparedOutput {
                input: p.input.display().to_string(),
                output: p.output.display().to_string(),
                rows: p.rows,
                dropped: p.dropped,
            })
            .collect()
    } else {
        let table = prepare_file(&args.path, &args.output)
            .with_context(|| format!("Failed to prepare {}", args.path.display()))?;
        vec![PreparedOutput {
            input: args.path.display().to_string(),
            output: args.output.display().to_string(),
            rows: table.rows.len(),
            dropped: table.dropped,
        }]
    };

    if output.is_json() {
        return output.result(prepared);
    }

    let count = prepared.len();
    output.table(prepared);
    output.success(format!("Prepared {} training table(s)", count));
    Ok(())
}

/// (input, output) pairs the command would write
fn planned_outputs(args: &PrepareArgs) -> Result<Vec<(PathBuf, PathBuf)>> {
    if !args.path.is_dir() {
        return Ok(vec![(args.path.clone(), args.output.clone())]);
    }

    let mut pairs: Vec<(PathBuf, PathBuf)> = fs::read_dir(&args.path)
        .with_context(|| format!("Failed to list {}", args.path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .map(|input| {
            let label = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let target = args.output.join(format!("{}.csv", label));
            (input, target)
        })
        .collect();
    pairs.sort();
    Ok(pairs)
}
