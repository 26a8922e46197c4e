//! Per-point raster samples.
//!
//! Row `i` of a [`SampleTable`] always belongs to grid point `i`; tables are
//! only ever built by appending whole columns of equal length.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{BioSentinelError, Result};

/// One sampled pixel value or the no-data marker
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "Option<f64>")]
pub enum SampleValue {
    Value(f64),
    NoData,
}

impl SampleValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            SampleValue::Value(v) => Some(*v),
            SampleValue::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, SampleValue::NoData)
    }
}

impl From<Option<f64>> for SampleValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => SampleValue::Value(v),
            _ => SampleValue::NoData,
        }
    }
}

impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Column-major table of samples, one column per layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTable {
    rows: usize,
    columns: Vec<String>,
    values: Vec<Vec<SampleValue>>,
}

impl SampleTable {
    /// Empty table for `rows` points
    pub fn new(rows: usize) -> Self {
        Self { rows, columns: Vec::new(), values: Vec::new() }
    }

    /// Append a column; its length must equal the row count
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<SampleValue>) -> Result<()> {
        if values.len() != self.rows {
            return Err(BioSentinelError::Alignment {
                points: self.rows,
                samples: values.len(),
                outputs: self.rows,
            });
        }
        self.columns.push(name.into());
        self.values.push(values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[SampleValue]> {
        self.columns.iter().position(|c| c == name).map(|idx| self.values[idx].as_slice())
    }

    /// Values of row `index` in column order
    pub fn row(&self, index: usize) -> Option<Vec<SampleValue>> {
        if index >= self.rows {
            return None;
        }
        Some(self.values.iter().map(|column| column[index]).collect())
    }

    /// Number of no-data cells per column
    pub fn no_data_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .zip(&self.values)
            .map(|(name, column)| (name.clone(), column.iter().filter(|v| v.is_no_data()).count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_column_enforces_row_count() {
        let mut table = SampleTable::new(2);
        table.push_column("NDVI", vec![SampleValue::Value(0.5), SampleValue::NoData]).unwrap();

        let err = table.push_column("DEM", vec![SampleValue::Value(120.0)]).unwrap_err();
        assert!(matches!(err, BioSentinelError::Alignment { points: 2, samples: 1, .. }));
        assert_eq!(table.columns(), &["NDVI".to_string()]);
    }

    #[test]
    fn test_rows_follow_column_order() {
        let mut table = SampleTable::new(2);
        table.push_column("NDVI", vec![SampleValue::Value(0.5), SampleValue::Value(0.6)]).unwrap();
        table.push_column("DEM", vec![SampleValue::NoData, SampleValue::Value(310.0)]).unwrap();

        assert_eq!(table.row(0).unwrap(), vec![SampleValue::Value(0.5), SampleValue::NoData]);
        assert_eq!(table.row(1).unwrap(), vec![SampleValue::Value(0.6), SampleValue::Value(310.0)]);
        assert!(table.row(2).is_none());
        assert_eq!(table.no_data_counts()[1], ("DEM".to_string(), 1));
    }

    #[test]
    fn test_no_data_serializes_as_null() {
        let json = serde_json::to_string(&vec![SampleValue::Value(1.5), SampleValue::NoData]).unwrap();
        assert_eq!(json, "[1.5,null]");

        let parsed: Vec<SampleValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![SampleValue::Value(1.5), SampleValue::NoData]);
    }
}
