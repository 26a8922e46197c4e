use crate::error::Result;
use crate::models::{FeatureMatrix, OutputMatrix};

/// Port for the black-box regression model
pub trait RegressionModel {
    /// Feature columns the model expects, in order
    fn feature_names(&self) -> &[String];

    /// Output columns the model produces, in order
    fn output_names(&self) -> &[String];

    /// Map N feature rows to N output rows. Pure and deterministic.
    fn predict(&self, features: &FeatureMatrix) -> Result<OutputMatrix>;
}
