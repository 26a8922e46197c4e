//! Cleaning of exported per-feature statistics tables into training tables.
//!
//! Input columns of interest: `system:index` and `.geo` (dropped), the raw
//! MODIS `LST_Day_1km` mean (converted to `LST_C`) and `id` (moved first).
//! Every other column passes through in its original order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_geo::models::centroid;
use biosentinel_geo::repair_value;

pub const GEOMETRY_COLUMN: &str = ".geo";
pub const INDEX_COLUMN: &str = "system:index";
pub const LST_RAW_COLUMN: &str = "LST_Day_1km";
pub const LST_COLUMN: &str = "LST_C";
pub const ID_COLUMN: &str = "id";

/// MODIS LST digital number to degrees Celsius
pub fn lst_celsius(raw: f64) -> f64 {
    raw * 0.02 - 273.15
}

/// Cleaned table; every cell is present
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Input rows dropped for a missing value
    pub dropped: usize,
}

impl TrainingTable {
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

/// One file handled by [`prepare_directory`]
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub dropped: usize,
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null")
}

fn geometry_centroid(row: usize, raw: &str) -> Option<(f64, f64)> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(row, error = %e, "Unparseable geometry, treating position as missing");
            return None;
        }
    };
    match repair_value(&value) {
        Ok(geometry) => match centroid(&geometry) {
            Some(point) => Some((point.lon, point.lat)),
            None => {
                tracing::warn!(row, "Geometry has no centroid, treating position as missing");
                None
            }
        },
        Err(e) => {
            tracing::warn!(row, error = %e, "Invalid geometry, treating position as missing");
            None
        }
    }
}

fn csv_error(e: csv::Error) -> BioSentinelError {
    BioSentinelError::Serialization(format!("CSV error: {}", e))
}

/// Clean one exported statistics table
pub fn prepare_training_table<R: io::Read>(reader: R) -> Result<TrainingTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> =
        reader.headers().map_err(csv_error)?.iter().map(|h| h.trim().to_owned()).collect();

    if headers.is_empty() {
        return Err(BioSentinelError::Serialization("CSV file contains no header row".to_owned()));
    }

    let geo_idx = headers.iter().position(|h| h == GEOMETRY_COLUMN);
    let lst_idx = headers.iter().position(|h| h == LST_RAW_COLUMN);

    // Passthrough columns, `id` first
    let mut kept: Vec<usize> = (0..headers.len())
        .filter(|&i| {
            let h = headers[i].as_str();
            h != GEOMETRY_COLUMN && h != INDEX_COLUMN && h != LST_RAW_COLUMN
        })
        .collect();
    if let Some(pos) = kept.iter().position(|&i| headers[i] == ID_COLUMN) {
        let id = kept.remove(pos);
        kept.insert(0, id);
    }

    let mut columns: Vec<String> = kept.iter().map(|&i| headers[i].clone()).collect();
    if geo_idx.is_some() {
        columns.push("longitude".to_string());
        columns.push("latitude".to_string());
    }
    if lst_idx.is_some() {
        columns.push(LST_COLUMN.to_string());
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let mut row: Vec<Option<String>> =
            kept.iter().map(|&i| Some(cell(i).trim().to_owned()).filter(|c| !is_missing(c))).collect();

        if let Some(i) = geo_idx {
            match geometry_centroid(row_idx, cell(i)) {
                Some((lon, lat)) => {
                    row.push(Some(lon.to_string()));
                    row.push(Some(lat.to_string()));
                }
                None => {
                    row.push(None);
                    row.push(None);
                }
            }
        }

        if let Some(i) = lst_idx {
            let raw = cell(i).trim().parse::<f64>().ok().filter(|v| v.is_finite());
            row.push(raw.map(|v| lst_celsius(v).to_string()));
        }

        match row.into_iter().collect::<Option<Vec<String>>>() {
            Some(complete) => rows.push(complete),
            None => dropped += 1,
        }
    }

    tracing::debug!(rows = rows.len(), dropped, "Prepared training table");
    Ok(TrainingTable { columns, rows, dropped })
}

pub fn write_training_table<W: io::Write>(table: &TrainingTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Clean `input` into `output`
pub fn prepare_file(input: &Path, output: &Path) -> Result<TrainingTable> {
    let table = prepare_training_table(fs::File::open(input)?)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_training_table(&table, fs::File::create(output)?)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = table.rows.len(),
        dropped = table.dropped,
        "Saved training table"
    );
    Ok(table)
}

/// Clean every `.csv` in `input_dir` into `output_dir/{lowercased stem}.csv`.
///
/// A file that fails is logged and skipped.
pub fn prepare_directory(input_dir: &Path, output_dir: &Path) -> Result<Vec<PreparedFile>> {
    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    inputs.sort();

    fs::create_dir_all(output_dir)?;

    let mut prepared = Vec::with_capacity(inputs.len());
    for input in inputs {
        let label = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let output = output_dir.join(format!("{}.csv", label));

        match prepare_file(&input, &output) {
            Ok(table) => prepared.push(PreparedFile {
                input,
                output,
                rows: table.rows.len(),
                dropped: table.dropped,
            }),
            Err(e) => tracing::warn!(input = %input.display(), error = %e, "Failed to prepare training table"),
        }
    }

    Ok(prepared)
}
