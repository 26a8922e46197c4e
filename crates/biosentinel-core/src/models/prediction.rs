use serde::{Deserialize, Serialize};

use crate::models::region::Point;
use crate::models::sample::SampleValue;

/// Model input: N rows of K named features, `None` for missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Model output: N rows of M named targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl OutputMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One geo-referenced prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub point: Point,
    /// Raw sampled covariates in layer order
    pub covariates: Vec<(String, SampleValue)>,
    /// Named model outputs in model order
    pub outputs: Vec<(String, f64)>,
}
