//! Command implementations

mod config;
mod extract;
mod grid;
mod predict;
mod prepare;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Grid(args) => grid::execute(args, config_file, &output),
        Commands::Predict(args) => predict::execute(args, config_file, &output, cli.dry_run),
        Commands::Extract(args) => extract::execute(args, config_file, &output, cli.dry_run),
        Commands::Prepare(args) => prepare::execute(args, &output, cli.dry_run),
        Commands::Config => config::execute(config_file, &output),
    }
}
