//! Feature records and typed property schemas.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BioSentinelError, Result};
use crate::models::geometry::Geometry;

/// Target fields carried by ground-truth training polygons
pub const TRAINING_TARGETS: [&str; 3] = ["Biota_Overlap", "Rel_Occupancy", "Rel_Species_Richness"];

/// Positional covariates appended after the raster layer columns
pub const POSITION_COVARIATES: [&str; 2] = ["longitude", "latitude"];

/// Scalar property value. Nested JSON is not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Convert a JSON value. `Ok(None)` for null, `Err` with a reason for arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> std::result::Result<Option<Self>, String> {
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Bool(b) => Ok(Some(PropertyValue::Bool(*b))),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Some(PropertyValue::Integer(i))),
                None => n
                    .as_f64()
                    .map(|f| Some(PropertyValue::Number(f)))
                    .ok_or_else(|| format!("number {} is not representable", n)),
            },
            serde_json::Value::String(s) => Ok(Some(PropertyValue::Text(s.clone()))),
            serde_json::Value::Array(_) => Err("arrays are not scalar".to_string()),
            serde_json::Value::Object(_) => Err("objects are not scalar".to_string()),
        }
    }

    /// Numeric view (integers widen to f64, numeric strings are not parsed)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Number(f) => Some(*f),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::Integer(i) => serde_json::Value::from(*i),
            PropertyValue::Number(f) => serde_json::Value::from(*f),
            PropertyValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Ordered property mapping
pub type Properties = BTreeMap<String, PropertyValue>;

/// What to do with keys outside a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnknownKeyPolicy {
    /// Fail with `PropertyRejected`
    Reject,
    /// Drop the key
    #[default]
    Ignore,
}

/// Documented set of property keys expected at one use site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    pub allowed: BTreeSet<String>,
    pub unknown_keys: UnknownKeyPolicy,
}

impl PropertySchema {
    pub fn new<I, S>(name: impl Into<String>, allowed: I, unknown_keys: UnknownKeyPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
            unknown_keys,
        }
    }

    /// Ground-truth polygons submitted for bulk extraction
    pub fn training() -> Self {
        Self::new("training", TRAINING_TARGETS, UnknownKeyPolicy::Ignore)
    }

    /// Inference covariates: one column per layer plus the position columns
    pub fn covariates<I, S>(layer_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allowed: BTreeSet<String> = layer_columns.into_iter().map(Into::into).collect();
        allowed.extend(POSITION_COVARIATES.iter().map(|k| k.to_string()));
        Self { name: "covariates".to_string(), allowed, unknown_keys: UnknownKeyPolicy::Reject }
    }

    /// Validate raw JSON properties of record `record` against the schema.
    ///
    /// Null values are dropped. Non-scalar values are always rejected.
    pub fn validate(
        &self,
        record: u64,
        raw: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Properties> {
        let mut properties = Properties::new();

        for (key, value) in raw {
            if !self.allowed.contains(key) {
                match self.unknown_keys {
                    UnknownKeyPolicy::Reject => {
                        return Err(BioSentinelError::PropertyRejected {
                            record,
                            key: key.clone(),
                            reason: format!("not part of the '{}' schema", self.name),
                        });
                    }
                    UnknownKeyPolicy::Ignore => {
                        tracing::debug!(record, key = %key, schema = %self.name, "Ignoring unknown property");
                        continue;
                    }
                }
            }

            match PropertyValue::from_json(value) {
                Ok(Some(v)) => {
                    properties.insert(key.clone(), v);
                }
                Ok(None) => {}
                Err(reason) => {
                    return Err(BioSentinelError::PropertyRejected {
                        record,
                        key: key.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(properties)
    }
}

/// One repaired geometry with its validated properties.
///
/// `id` is the record's position in the source collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: u64,
    pub geometry: Geometry,
    pub properties: Properties,
}

impl FeatureRecord {
    pub fn new(id: u64, geometry: Geometry, properties: Properties) -> Self {
        Self { id, geometry, properties }
    }

    /// GeoJSON feature with the record id set as the `id` property
    pub fn to_geojson(&self) -> serde_json::Value {
        let mut props: serde_json::Map<String, serde_json::Value> =
            self.properties.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        props.insert("id".to_string(), serde_json::Value::from(self.id));

        serde_json::json!({
            "type": "Feature",
            "geometry": self.geometry.to_geojson(),
            "properties": props,
        })
    }
}
