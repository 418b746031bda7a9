//! The model capability consumed by the prediction service.

use damage_map_disaster_models::FeatureVector;

use crate::PredictionError;

/// A trained regressor over a fixed set of named columns.
///
/// Scores are raw model outputs; the damage models were trained on
/// `ln(1 + dollars)`, so callers convert with
/// [`crate::service::raw_to_dollars`].
pub trait Regressor: Send + Sync {
    /// Column names in the order [`Self::predict_row`] expects them.
    fn feature_names(&self) -> &[String];

    /// Scores one row laid out in [`Self::feature_names`] order.
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Scores a name-keyed feature row.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::ModelInferenceFailure`] if a trained
    /// column is absent from `features`.
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let row = self
            .feature_names()
            .iter()
            .map(|name| {
                features.get(name).ok_or_else(|| {
                    PredictionError::ModelInferenceFailure(format!("missing feature {name}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.predict_row(&row))
    }
}
