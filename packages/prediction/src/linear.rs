//! Linear regressors: an intercept plus one named coefficient per column.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{PredictionError, regressor::Regressor};

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    intercept: f64,
    coefficients: BTreeMap<String, f64>,
}

/// `intercept + sum(weight * value)` over named columns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "LinearModelFile")]
pub struct LinearModel {
    intercept: f64,
    feature_names: Vec<String>,
    weights: Vec<f64>,
}

impl From<LinearModelFile> for LinearModel {
    fn from(file: LinearModelFile) -> Self {
        let (feature_names, weights) = file.coefficients.into_iter().unzip();
        Self {
            intercept: file.intercept,
            feature_names,
            weights,
        }
    }
}

impl LinearModel {
    /// Creates a model from named coefficients.
    #[must_use]
    pub fn new(intercept: f64, coefficients: impl IntoIterator<Item = (String, f64)>) -> Self {
        LinearModelFile {
            intercept,
            coefficients: coefficients.into_iter().collect(),
        }
        .into()
    }

    /// Checks that every parameter is finite.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::InvalidModel`] naming the first
    /// non-finite parameter.
    pub fn validate(&self) -> Result<(), PredictionError> {
        if !self.intercept.is_finite() {
            return Err(PredictionError::InvalidModel(
                "linear model has a non-finite intercept".to_string(),
            ));
        }
        if let Some((name, _)) = self
            .feature_names
            .iter()
            .zip(&self.weights)
            .find(|(_, w)| !w.is_finite())
        {
            return Err(PredictionError::InvalidModel(format!(
                "linear model coefficient {name} is not finite"
            )));
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}
