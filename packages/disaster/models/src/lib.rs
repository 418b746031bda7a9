#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Disaster type taxonomy, scenario inputs, and feature vectors.
//!
//! This crate defines the six disaster types the damage models were
//! trained for, the user-entered scenario that drives a prediction, and the
//! name-keyed [`FeatureVector`] handed to a model. It has no knowledge of
//! how per-type schemas are declared or how models are loaded.

pub mod columns;
pub mod inputs;
pub mod vector;

pub use inputs::{Casualties, ScenarioInputs};
pub use vector::FeatureVector;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The disaster types with a trained damage model.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DisasterType {
    /// Rotating column of air reaching the ground.
    #[serde(rename = "Tornado")]
    #[strum(serialize = "Tornado")]
    Tornado,
    /// Overflow of water onto normally dry land.
    #[serde(rename = "Flood")]
    #[strum(serialize = "Flood")]
    Flood,
    /// Atmospheric electrostatic discharge.
    #[serde(rename = "Lightning")]
    #[strum(serialize = "Lightning")]
    Lightning,
    /// Sustained damaging winds.
    #[serde(rename = "High Wind")]
    #[strum(
        to_string = "High Wind",
        serialize = "high_wind",
        serialize = "high-wind"
    )]
    HighWind,
    /// Uncontrolled fire in natural areas.
    #[serde(rename = "Wildfire")]
    #[strum(serialize = "Wildfire")]
    Wildfire,
    /// Low-pressure system with organized thunderstorms.
    #[serde(rename = "Tropical Depression")]
    #[strum(
        to_string = "Tropical Depression",
        serialize = "tropical_depression",
        serialize = "tropical-depression"
    )]
    TropicalDepression,
}

impl DisasterType {
    /// Returns all variants of this enum, in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Tornado,
            Self::Flood,
            Self::Lightning,
            Self::HighWind,
            Self::Wildfire,
            Self::TropicalDepression,
        ]
    }

    /// Short definition shown next to the disaster type selection.
    #[must_use]
    pub const fn definition(self) -> &'static str {
        match self {
            Self::Tornado => {
                "A rapidly rotating column of air extending from a thunderstorm to the ground."
            }
            Self::Flood => "An overflow of water onto normally dry land.",
            Self::Lightning => "A sudden electrostatic discharge in the atmosphere.",
            Self::HighWind => "Sustained strong winds capable of causing damage.",
            Self::Wildfire => "An uncontrolled fire spreading rapidly in natural areas.",
            Self::TropicalDepression => {
                "A low-pressure weather system with organized thunderstorms."
            }
        }
    }

    /// File stem of the serialized model for this disaster type.
    #[must_use]
    pub const fn model_stem(self) -> &'static str {
        match self {
            Self::Tornado => "tornado_model",
            Self::Flood => "flood_model",
            Self::Lightning => "lightning_model",
            Self::HighWind => "high_wind_model",
            Self::Wildfire => "wildfire_model",
            Self::TropicalDepression => "tropical_depression_model",
        }
    }

    /// Lower-case name used in user-facing sentences ("recorded high wind").
    #[must_use]
    pub fn lowercase_name(self) -> String {
        self.to_string().to_lowercase()
    }
}
