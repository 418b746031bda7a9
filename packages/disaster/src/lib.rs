#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Disaster schema registry and feature vector assembly.
//!
//! Each disaster type's model layout (valid states, disaster-specific
//! measurements, categorical one-hot fields) is declared once in a TOML
//! file under `packages/disaster/schemas/` and embedded at compile time.
//! [`features::build`] turns a user scenario plus county attributes into
//! the exact column set the matching model was trained on.

pub mod features;
pub mod registry;
pub mod schema;

use damage_map_disaster_models::DisasterType;
use damage_map_geography_models::FIRST_HISTORICAL_YEAR;
use thiserror::Error;

/// Errors raised while loading or validating schema declarations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A TOML document could not be parsed.
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two columns of the same schema share a name.
    #[error("{disaster} schema declares column '{column}' more than once")]
    DuplicateColumn {
        /// Schema owner.
        disaster: DisasterType,
        /// Repeated column.
        column: String,
    },

    /// A categorical option column does not start with its field prefix.
    #[error("{disaster} option column '{column}' does not start with '{field}_'")]
    OptionPrefix {
        /// Schema owner.
        disaster: DisasterType,
        /// Categorical field name.
        field: String,
        /// Offending column.
        column: String,
    },

    /// A categorical field has two options with the same label, or none.
    #[error("{disaster} categorical field '{field}' has invalid options: {message}")]
    InvalidOptions {
        /// Schema owner.
        disaster: DisasterType,
        /// Categorical field name.
        field: String,
        /// What is wrong.
        message: String,
    },

    /// A state name is not in canonical title case.
    #[error("{disaster} schema state '{state}' is not title-cased")]
    NonCanonicalState {
        /// Schema owner.
        disaster: DisasterType,
        /// Offending state.
        state: String,
    },

    /// The schema has no valid states.
    #[error("{disaster} schema has no states")]
    NoStates {
        /// Schema owner.
        disaster: DisasterType,
    },

    /// More than one schema was declared for a disaster type.
    #[error("Duplicate schema for {0}")]
    DuplicateDisaster(DisasterType),

    /// No schema was declared for a disaster type.
    #[error("No schema declared for {0}")]
    MissingDisaster(DisasterType),
}

/// Errors raised while assembling a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// The selected state has no history of this disaster type.
    #[error(
        "There have not been any recorded {} in the State of {state} since {}",
        disaster.lowercase_name(),
        FIRST_HISTORICAL_YEAR
    )]
    UnsupportedState {
        /// Selected disaster type.
        disaster: DisasterType,
        /// State as selected.
        state: String,
    },

    /// A categorical selection is not one of the field's options.
    #[error("'{value}' is not a valid option for {field}")]
    UnknownCategoricalValue {
        /// Categorical field name.
        field: String,
        /// Selected label.
        value: String,
    },

    /// A categorical field has no selection.
    #[error("No value selected for {field}")]
    MissingCategoricalValue {
        /// Categorical field name.
        field: String,
    },

    /// A selection was supplied for a field the schema does not declare.
    #[error("{disaster} has no categorical field {field}")]
    UnknownCategoricalField {
        /// Selected disaster type.
        disaster: DisasterType,
        /// Supplied field name.
        field: String,
    },

    /// A model measurement was not supplied.
    #[error("Missing value for {column}")]
    MissingMeasurement {
        /// Model column.
        column: String,
    },

    /// A measurement was supplied that the schema does not declare.
    #[error("{disaster} has no measurement {column}")]
    UnexpectedMeasurement {
        /// Selected disaster type.
        disaster: DisasterType,
        /// Supplied column.
        column: String,
    },

    /// A value is outside the range the form allows.
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        /// Input name.
        field: String,
        /// What is wrong.
        message: String,
    },
}
