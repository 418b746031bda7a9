#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County reference data types.
//!
//! These types describe the county-year economic panel (GDP per capita and
//! population density) that feeds every damage prediction, independent of
//! how the panel is loaded.

pub mod states;

/// First year covered by the historical storm-event records.
pub const FIRST_HISTORICAL_YEAR: i32 = 2007;

/// Last year with recorded GDP per capita and density in the panel.
pub const LAST_HISTORICAL_YEAR: i32 = 2022;

/// Latest scenario year a user may ask about.
pub const MAX_SCENARIO_YEAR: i32 = 2030;

/// One row of the county-year panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyRecord {
    /// State name as stored in the panel (e.g. "Texas").
    pub state: String,
    /// County name as stored in the panel (e.g. "Travis").
    pub county: String,
    /// Calendar year of the measurement.
    pub year: i32,
    /// GDP per capita in dollars.
    pub gdp_per_capita: f64,
    /// Population density (people per square km).
    pub density: f64,
}

impl CountyRecord {
    /// Returns the economic attributes carried by this record.
    #[must_use]
    pub const fn attributes(&self) -> CountyAttributes {
        CountyAttributes {
            gdp_per_capita: self.gdp_per_capita,
            density: self.density,
        }
    }
}

/// The county-dependent features of a prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountyAttributes {
    /// GDP per capita in dollars.
    pub gdp_per_capita: f64,
    /// Population density (people per square km).
    pub density: f64,
}

/// Where county attributes come from when the scenario year is after
/// [`LAST_HISTORICAL_YEAR`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FutureYearSource {
    /// Values typed in by the user.
    Manual(CountyAttributes),
    /// Reuse the county's record for [`LAST_HISTORICAL_YEAR`].
    ///
    /// Presented to users as "Use predicted data"; no extrapolation is
    /// performed.
    LatestRecorded,
}
