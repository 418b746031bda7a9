#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County reference data store.
//!
//! Loads the county-year economic panel (`merged_data_county.csv`) and the
//! county boundary table (`cmap.csv`, WKT geometries) once per session.
//! Both are read-only after load: the panel answers GDP/density lookups for
//! a single scenario, and the boundary table drives the full-map batch
//! prediction.

pub mod boundaries;
pub mod panel;
pub mod paths;

use thiserror::Error;

/// Errors that can occur while loading or querying reference data.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// No panel record exists for the county in the requested year.
    #[error("No GDP or Density data found for {county}, {state} in the year {year}.")]
    InvalidGeography {
        /// State as selected.
        state: String,
        /// County as selected.
        county: String,
        /// Year that was looked up (the fallback year for future scenarios).
        year: i32,
    },

    /// The panel has no counties for the selected state.
    #[error("No counties found for the selected state: {state}")]
    MissingCounties {
        /// State as selected.
        state: String,
    },

    /// A geometry cell could not be parsed.
    #[error("Invalid geometry for county {county}: {message}")]
    Geometry {
        /// County the geometry belongs to.
        county: String,
        /// Parser message.
        message: String,
    },

    /// A required column is absent from a reference table.
    #[error("Missing column '{column}' in {table}")]
    MissingColumn {
        /// Table file name.
        table: String,
        /// Column name.
        column: String,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
