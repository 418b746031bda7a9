//! One regressor per disaster type, with column checks and the dollar
//! transform.

use std::collections::BTreeMap;
use std::path::Path;

use damage_map_disaster_models::{DisasterType, FeatureVector};

use crate::{
    PredictionError,
    model_file::{load_model, model_path},
    regressor::Regressor,
};

/// Converts a raw log-space score to dollars: `exp(raw) - 1`, floored at 0.
///
/// # Errors
///
/// Returns [`PredictionError::ModelInferenceFailure`] if the score or the
/// result is not finite.
pub fn raw_to_dollars(raw: f64) -> Result<f64, PredictionError> {
    if !raw.is_finite() {
        return Err(PredictionError::ModelInferenceFailure(format!(
            "model returned a non-finite score ({raw})"
        )));
    }

    let dollars = raw.exp_m1();
    if !dollars.is_finite() {
        return Err(PredictionError::ModelInferenceFailure(format!(
            "score {raw} overflows the dollar range"
        )));
    }

    Ok(dollars.max(0.0))
}

/// Holds the loaded regressors. Immutable once built.
#[derive(Default)]
pub struct PredictionService {
    models: BTreeMap<DisasterType, Box<dyn Regressor>>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PredictionService {
    /// Creates a service with no models.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the regressor for a disaster type, replacing any previous
    /// one.
    #[must_use]
    pub fn with_model(mut self, disaster: DisasterType, regressor: Box<dyn Regressor>) -> Self {
        self.models.insert(disaster, regressor);
        self
    }

    /// Loads every `<stem>.json` model present in `models_dir`.
    ///
    /// Missing files are logged and skipped; predicting for that disaster
    /// type then fails with [`PredictionError::ModelNotLoaded`].
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError`] if a model file exists but cannot be
    /// read or is invalid.
    pub fn load(models_dir: &Path) -> Result<Self, PredictionError> {
        let mut service = Self::new();

        for disaster in DisasterType::all() {
            let path = model_path(models_dir, *disaster);
            if !path.is_file() {
                log::warn!("No {disaster} model at {}", path.display());
                continue;
            }

            let regressor = load_model(&path)?;
            log::info!(
                "Loaded {disaster} model from {} ({} features)",
                path.display(),
                regressor.feature_names().len()
            );
            service.models.insert(*disaster, regressor);
        }

        Ok(service)
    }

    /// Returns `true` if a regressor is registered for the disaster type.
    #[must_use]
    pub fn has_model(&self, disaster: DisasterType) -> bool {
        self.models.contains_key(&disaster)
    }

    /// Disaster types with a registered regressor.
    pub fn loaded(&self) -> impl Iterator<Item = DisasterType> + '_ {
        self.models.keys().copied()
    }

    /// Predicts damage in dollars for one feature row.
    ///
    /// # Errors
    ///
    /// * [`PredictionError::ModelNotLoaded`] if no regressor is registered.
    /// * [`PredictionError::SchemaMismatch`] if the row's columns differ
    ///   from the regressor's trained columns.
    /// * [`PredictionError::ModelInferenceFailure`] if a value or the
    ///   result is not finite.
    pub fn predict(
        &self,
        disaster: DisasterType,
        features: &FeatureVector,
    ) -> Result<f64, PredictionError> {
        let regressor = self
            .models
            .get(&disaster)
            .ok_or(PredictionError::ModelNotLoaded(disaster))?;

        check_columns(disaster, regressor.feature_names(), features)?;

        if let Some((column, value)) = features.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PredictionError::ModelInferenceFailure(format!(
                "{column} is not a finite number ({value})"
            )));
        }

        raw_to_dollars(regressor.predict(features)?)
    }
}

fn check_columns(
    disaster: DisasterType,
    trained: &[String],
    features: &FeatureVector,
) -> Result<(), PredictionError> {
    let missing: Vec<String> = trained
        .iter()
        .filter(|name| !features.contains(name))
        .cloned()
        .collect();

    let extra: Vec<String> = features
        .column_names()
        .into_iter()
        .filter(|name| !trained.iter().any(|t| t.as_str() == *name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(PredictionError::SchemaMismatch {
            disaster,
            missing,
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::LinearModel;

    fn constant(names: &[&str], raw: f64) -> Box<dyn Regressor> {
        Box::new(LinearModel::new(raw, names.iter().map(|n| ((*n).to_string(), 0.0))))
    }

    fn row(names: &[&str]) -> FeatureVector {
        names.iter().map(|n| (*n, 1.0)).collect()
    }

    #[test]
    fn raw_zero_is_zero_dollars() {
        assert!(raw_to_dollars(0.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn inverts_log1p() {
        let dollars = raw_to_dollars(10.0).unwrap();
        assert!((dollars - (10.0_f64.exp() - 1.0)).abs() < 1e-6);
        assert!((dollars.ln_1p() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn negative_scores_floor_at_zero() {
        assert!(raw_to_dollars(-3.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_scores_fail() {
        assert!(raw_to_dollars(f64::NAN).is_err());
        assert!(raw_to_dollars(f64::INFINITY).is_err());
        assert!(raw_to_dollars(1_000.0).is_err());
    }

    #[test]
    fn predicts_with_exact_columns() {
        let model = constant(&["a", "b"], 0.0);
        let service = PredictionService::new().with_model(DisasterType::Lightning, model);
        let dollars = service
            .predict(DisasterType::Lightning, &row(&["a", "b"]))
            .unwrap();
        assert!(dollars.abs() < f64::EPSILON);
    }

    #[test]
    fn reports_missing_and_extra_columns() {
        let model = constant(&["a", "b"], 0.0);
        let service = PredictionService::new().with_model(DisasterType::Lightning, model);
        let err = service
            .predict(DisasterType::Lightning, &row(&["a", "c"]))
            .unwrap_err();

        match err {
            PredictionError::SchemaMismatch {
                disaster,
                missing,
                extra,
            } => {
                assert_eq!(disaster, DisasterType::Lightning);
                assert_eq!(missing, vec!["b".to_string()]);
                assert_eq!(extra, vec!["c".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_disaster_is_not_loaded() {
        let service = PredictionService::new();
        assert!(matches!(
            service.predict(DisasterType::Flood, &FeatureVector::new()),
            Err(PredictionError::ModelNotLoaded(DisasterType::Flood))
        ));
    }

    #[test]
    fn rejects_non_finite_feature_values() {
        let model = constant(&["a"], 0.0);
        let service = PredictionService::new().with_model(DisasterType::Wildfire, model);
        let features: FeatureVector = [("a", f64::NAN)].into_iter().collect();
        assert!(matches!(
            service.predict(DisasterType::Wildfire, &features),
            Err(PredictionError::ModelInferenceFailure(_))
        ));
    }

    #[test]
    fn load_skips_missing_files() {
        let service = PredictionService::load(Path::new("/nonexistent/models")).unwrap();
        assert_eq!(service.loaded().count(), 0);
    }
}
