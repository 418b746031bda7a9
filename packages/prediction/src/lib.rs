#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Damage prediction.
//!
//! Models are black boxes behind the [`regressor::Regressor`] trait: they
//! take a named-column feature row and return one raw score in log space.
//! [`service::PredictionService`] owns one regressor per disaster type,
//! checks every row against the model's trained columns and converts the
//! raw score to dollars. [`batch::predict_all`] repeats a scenario across
//! every map county.

pub mod batch;
pub mod format;
pub mod linear;
pub mod model_file;
pub mod progress;
pub mod regressor;
pub mod service;
pub mod tree;

use std::path::PathBuf;

use damage_map_disaster_models::DisasterType;
use thiserror::Error;

pub use batch::{CountyPrediction, predict_all};
pub use format::format_dollars;
pub use service::PredictionService;

/// Errors raised while loading models or predicting.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// A model file could not be read.
    #[error("Failed to read model file {}: {source}", path.display())]
    ModelRead {
        /// Model file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A model file is not valid JSON or does not match the model format.
    #[error("Failed to parse model file: {0}")]
    Json(#[from] serde_json::Error),

    /// A model file parsed but is internally inconsistent.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// No regressor is registered for the disaster type.
    #[error("No model loaded for {0}")]
    ModelNotLoaded(DisasterType),

    /// The feature row does not have exactly the model's trained columns.
    #[error(
        "{disaster} feature row does not match the trained model (missing: {}; unexpected: {})",
        list_or_none(missing),
        list_or_none(extra)
    )]
    SchemaMismatch {
        /// Disaster type of the model.
        disaster: DisasterType,
        /// Trained columns absent from the row.
        missing: Vec<String>,
        /// Row columns the model was not trained on.
        extra: Vec<String>,
    },

    /// The model could not produce a usable prediction.
    #[error("{0}")]
    ModelInferenceFailure(String),
}

fn list_or_none(columns: &[String]) -> String {
    if columns.is_empty() {
        "none".to_string()
    } else {
        columns.join(", ")
    }
}
