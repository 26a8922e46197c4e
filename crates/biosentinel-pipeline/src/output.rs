//! GeoJSON rendering of prediction records.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::PredictionRecord;

/// Point feature with position, covariate and output properties. NoData becomes `null`.
pub fn to_feature(record: &PredictionRecord) -> Value {
    let mut properties = Map::new();
    properties.insert("longitude".to_string(), json!(record.point.lon));
    properties.insert("latitude".to_string(), json!(record.point.lat));
    for (name, value) in &record.covariates {
        properties.insert(name.clone(), json!(value.value()));
    }
    for (name, value) in &record.outputs {
        properties.insert(name.clone(), json!(value));
    }

    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [record.point.lon, record.point.lat],
        },
        "properties": properties,
    })
}

pub fn to_feature_collection(records: &[PredictionRecord]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": records.iter().map(to_feature).collect::<Vec<_>>(),
    })
}

/// Write `records` as a pretty-printed GeoJSON FeatureCollection
pub fn write_geojson(path: &Path, records: &[PredictionRecord]) -> Result<()> {
    let content = serde_json::to_string_pretty(&to_feature_collection(records))
        .map_err(|e| BioSentinelError::Serialization(format!("Failed to encode predictions: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    tracing::info!(path = %path.display(), features = records.len(), "Wrote predictions");
    Ok(())
}
