//! Name-keyed feature rows.

use std::collections::{BTreeMap, BTreeSet};

use damage_map_geography_models::CountyAttributes;
use serde::Serialize;

use crate::columns;

/// One model input row: column name to value.
///
/// Built fresh for every prediction and never persisted. Iteration order is
/// by column name; models consume rows by name, never by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    columns: BTreeMap<String, f64>,
}

impl FeatureVector {
    /// Creates an empty vector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Sets a column, returning the previous value if it was already set.
    pub fn insert(&mut self, column: impl Into<String>, value: f64) -> Option<f64> {
        self.columns.insert(column.into(), value)
    }

    /// Returns the value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.get(column).copied()
    }

    /// Returns `true` if the column is present.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if no column is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over `(column, value)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The set of column names.
    #[must_use]
    pub fn column_names(&self) -> BTreeSet<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Returns a copy with only `GDP_per_capita` and `Density` replaced by
    /// the given county's values. Every other column is left untouched.
    #[must_use]
    pub fn with_county_attributes(&self, attributes: CountyAttributes) -> Self {
        let mut out = self.clone();
        out.insert(columns::GDP_PER_CAPITA, attributes.gdp_per_capita);
        out.insert(columns::DENSITY, attributes.density);
        out
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
