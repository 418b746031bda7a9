//! JSON model files.
//!
//! Each disaster's regressor lives in `<models_dir>/<stem>.json`, tagged by
//! `kind`:
//!
//! ```json
//! { "kind": "tree_ensemble", "feature_names": ["Year", "..."],
//!   "aggregation": "mean", "trees": [{ "nodes": [
//!     { "feature": 0, "threshold": 2015.5, "left": 1, "right": 2 },
//!     { "value": 8.1 }, { "value": 9.4 } ] }] }
//!
//! { "kind": "linear", "intercept": 3.2,
//!   "coefficients": { "Year": 0.01, "...": 0.5 } }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use damage_map_disaster_models::DisasterType;
use serde::Deserialize;

use crate::{PredictionError, linear::LinearModel, regressor::Regressor, tree::TreeEnsemble};

/// A deserialized model file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelFile {
    /// Decision-tree ensemble.
    TreeEnsemble(TreeEnsemble),
    /// Linear model.
    Linear(LinearModel),
}

impl ModelFile {
    /// Validates the model and boxes it as a [`Regressor`].
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::InvalidModel`] if the model is
    /// inconsistent or declares a column twice.
    pub fn into_regressor(self) -> Result<Box<dyn Regressor>, PredictionError> {
        let regressor: Box<dyn Regressor> = match self {
            Self::TreeEnsemble(ensemble) => Box::new(ensemble),
            Self::Linear(model) => {
                model.validate()?;
                Box::new(model)
            }
        };

        let names = regressor.feature_names();
        let unique: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if unique.len() != names.len() {
            return Err(PredictionError::InvalidModel("feature names are not unique".to_string()));
        }

        Ok(regressor)
    }
}

/// Path of the model file for a disaster type.
#[must_use]
pub fn model_path(models_dir: &Path, disaster: DisasterType) -> PathBuf {
    models_dir.join(format!("{}.json", disaster.model_stem()))
}

/// Parses a regressor from a JSON document.
///
/// # Errors
///
/// Returns [`PredictionError`] if the JSON is malformed or the model is
/// invalid.
pub fn parse_model_json(json: &str) -> Result<Box<dyn Regressor>, PredictionError> {
    let file: ModelFile = serde_json::from_str(json)?;
    file.into_regressor()
}

/// Loads a regressor from a model file.
///
/// # Errors
///
/// Returns [`PredictionError`] if the file cannot be read or parsed.
pub fn load_model(path: &Path) -> Result<Box<dyn Regressor>, PredictionError> {
    let json = std::fs::read_to_string(path).map_err(|source| PredictionError::ModelRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_model_json(&json)
}

#[cfg(test)]
mod tests {
    use damage_map_disaster_models::FeatureVector;

    use super::*;

    const FOREST: &str = r#"{
        "kind": "tree_ensemble",
        "feature_names": ["Year", "Density"],
        "trees": [
            { "nodes": [
                { "feature": 1, "threshold": 100, "left": 1, "right": 2 },
                { "value": 1.0 },
                { "value": 3.0 }
            ] },
            { "nodes": [ { "value": 2.0 } ] }
        ]
    }"#;

    #[test]
    fn parses_tree_ensemble() {
        let model = parse_model_json(FOREST).unwrap();
        assert_eq!(model.feature_names(), ["Year", "Density"]);

        let sparse: FeatureVector = [("Year", 2020.0), ("Density", 50.0)].into_iter().collect();
        let dense: FeatureVector = [("Year", 2020.0), ("Density", 500.0)].into_iter().collect();
        assert!((model.predict(&sparse).unwrap() - 1.5).abs() < 1e-12);
        assert!((model.predict(&dense).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn parses_linear_model() {
        let model = parse_model_json(
            r#"{ "kind": "linear", "intercept": 0.5, "coefficients": { "Year": 0.001 } }"#,
        )
        .unwrap();
        let row: FeatureVector = [("Year", 2000.0)].into_iter().collect();
        assert!((model.predict(&row).unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(matches!(
            parse_model_json(r#"{ "kind": "svm" }"#),
            Err(PredictionError::Json(_))
        ));
    }

    #[test]
    fn rejects_duplicate_feature_names() {
        let json = FOREST.replace("\"Density\"]", "\"Year\"]");
        assert!(matches!(
            parse_model_json(&json),
            Err(PredictionError::InvalidModel(_))
        ));
    }

    #[test]
    fn rejects_self_looping_tree() {
        let json = r#"{
            "kind": "tree_ensemble",
            "feature_names": ["Year"],
            "trees": [{ "nodes": [
                { "feature": 0, "threshold": 2015, "left": 0, "right": 0 }
            ] }]
        }"#;
        assert!(parse_model_json(json).is_err());
    }

    #[test]
    fn model_path_uses_stem() {
        assert_eq!(
            model_path(Path::new("models"), DisasterType::HighWind),
            Path::new("models/high_wind_model.json")
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let Err(err) = load_model(Path::new("/nonexistent/tornado_model.json")) else {
            panic!("expected a missing model file to fail");
        };
        assert!(err.to_string().contains("tornado_model.json"));
    }
}
