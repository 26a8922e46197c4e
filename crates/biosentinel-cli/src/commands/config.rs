//! Config command implementation

use anyhow::Result;
use std::path::Path;

use biosentinel_core::config::CliConfigOverrides;

use crate::config_loader::{config_path, load_config};
use crate::output::OutputWriter;
use crate::output_types::ConfigEntry;

pub fn execute(config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_file, CliConfigOverrides::default())?;

    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source: format!("{:?}", source) })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(entries);
    }

    output.section("Configuration");
    match config_path(config_file) {
        Some(path) => output.kv("File", path.display()),
        None => output.kv("File", "(none)"),
    }
    output.table(entries);
    Ok(())
}
