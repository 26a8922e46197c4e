use std::time::Duration;

use serde::{Deserialize, Serialize};

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{FeatureMatrix, OutputMatrix};
use biosentinel_core::ports::RegressionModel;

use crate::session::RemoteSession;

/// Regression model served over HTTP at `{base}/predict`
pub struct HttpRegressionModel {
    session: RemoteSession,
    feature_names: Vec<String>,
    output_names: Vec<String>,
}

impl HttpRegressionModel {
    pub fn new(
        base_url: impl Into<String>,
        feature_names: Vec<String>,
        output_names: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self { session: RemoteSession::new(base_url, timeout)?, feature_names, output_names })
    }
}

impl RegressionModel for HttpRegressionModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<OutputMatrix> {
        if features.columns != self.feature_names {
            return Err(BioSentinelError::remote(
                "predict",
                format!(
                    "model expects features {:?}, got {:?}",
                    self.feature_names, features.columns
                ),
            ));
        }

        let request = PredictRequest { features: &features.columns, rows: &features.rows };
        let response: PredictResponse = self
            .session
            .post_json("predict", &request)
            .map_err(|reason| BioSentinelError::remote("predict", reason))?;

        if response.outputs != self.output_names {
            return Err(BioSentinelError::remote(
                "predict",
                format!("model returned outputs {:?}, expected {:?}", response.outputs, self.output_names),
            ));
        }
        if let Some(row) = response.rows.iter().position(|r| r.len() != response.outputs.len()) {
            return Err(BioSentinelError::remote(
                "predict",
                format!("output row {} has {} values", row, response.rows[row].len()),
            ));
        }

        tracing::debug!(rows = response.rows.len(), "Model prediction complete");
        Ok(OutputMatrix { columns: response.outputs, rows: response.rows })
    }
}

/// Request body for the prediction endpoint. Missing values travel as `null`.
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a [String],
    rows: &'a [Vec<Option<f64>>],
}

/// Response from the prediction endpoint
#[derive(Debug, Deserialize)]
struct PredictResponse {
    outputs: Vec<String>,
    rows: Vec<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosentinel_core::models::TRAINING_TARGETS;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn model(url: &str) -> HttpRegressionModel {
        HttpRegressionModel::new(
            url,
            names(&["NDVI", "LST_C", "DEM", "longitude", "latitude"]),
            names(&TRAINING_TARGETS),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn test_model_creation() {
        let model = model("http://localhost:8700");
        assert_eq!(model.feature_names().len(), 5);
        assert_eq!(model.output_names()[0], "Biota_Overlap");
    }

    #[test]
    fn test_request_encodes_missing_as_null() {
        let columns = names(&["NDVI", "DEM"]);
        let rows = vec![vec![Some(0.4), None]];
        let body = serde_json::to_string(&PredictRequest { features: &columns, rows: &rows }).unwrap();
        assert_eq!(body, r#"{"features":["NDVI","DEM"],"rows":[[0.4,null]]}"#);
    }

    #[test]
    fn test_feature_mismatch_rejected_before_request() {
        let model = model("http://127.0.0.1:1");
        let features = FeatureMatrix { columns: names(&["NDVI"]), rows: vec![vec![Some(0.1)]] };

        match model.predict(&features) {
            Err(BioSentinelError::RemoteService { operation, reason }) => {
                assert_eq!(operation, "predict");
                assert!(reason.contains("model expects features"));
            }
            other => panic!("Expected RemoteService, got {:?}", other),
        }
    }
}
