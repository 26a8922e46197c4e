//! Reading raw GeoJSON into repaired feature records.

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{FeatureRecord, Properties, PropertySchema};

use crate::repair::repair_feature;

/// Parse a GeoJSON document into repaired feature records.
///
/// Record ids are positions in the source collection. Features without a
/// geometry are skipped, so ids may have gaps.
pub fn read_feature_collection(content: &str, schema: &PropertySchema) -> Result<Vec<FeatureRecord>> {
    let geojson: geojson::GeoJson = content
        .parse()
        .map_err(|e| BioSentinelError::Serialization(format!("Failed to parse GeoJSON: {}", e)))?;

    match geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            let mut records = Vec::with_capacity(fc.features.len());
            let mut skipped = 0usize;

            for (idx, feature) in fc.features.iter().enumerate() {
                match convert_feature(idx as u64, feature, schema)? {
                    Some(record) => records.push(record),
                    None => skipped += 1,
                }
            }

            tracing::info!(features = records.len(), skipped, "Read feature collection");
            Ok(records)
        }
        geojson::GeoJson::Feature(feature) => {
            Ok(convert_feature(0, &feature, schema)?.into_iter().collect())
        }
        geojson::GeoJson::Geometry(geometry) => {
            Ok(vec![FeatureRecord::new(0, repair_feature(0, &geometry)?, Properties::new())])
        }
    }
}

fn convert_feature(
    id: u64,
    feature: &geojson::Feature,
    schema: &PropertySchema,
) -> Result<Option<FeatureRecord>> {
    let geometry = match &feature.geometry {
        Some(geometry) => repair_feature(id, geometry)?,
        None => {
            tracing::debug!(id, "Skipping feature without geometry");
            return Ok(None);
        }
    };

    let properties = match &feature.properties {
        Some(raw) => schema.validate(id, raw)?,
        None => Properties::new(),
    };

    Ok(Some(FeatureRecord::new(id, geometry, properties)))
}
