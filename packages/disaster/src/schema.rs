//! Config-driven disaster model layout.
//!
//! [`DisasterSchema`] captures everything that differs between the six
//! damage models in a serializable config struct, so a single generic
//! feature builder serves all of them.

use std::collections::{BTreeSet, HashSet};

use damage_map_disaster_models::{DisasterType, columns};
use damage_map_geography_models::states::title_case;
use serde::Deserialize;

use crate::SchemaError;

// ── Top-level schema ─────────────────────────────────────────────────────

/// The full column layout of one disaster model.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisasterSchema {
    /// Disaster type this layout belongs to.
    pub disaster: DisasterType,
    /// States with recorded events since 2007, title-cased. Each one is a
    /// `State_<Name>` one-hot column.
    pub states: Vec<String>,
    /// Disaster-specific numeric measurements.
    #[serde(default)]
    pub numeric: Vec<NumericField>,
    /// Disaster-specific categorical fields, one-hot encoded.
    #[serde(default)]
    pub categorical: Vec<CategoricalField>,
}

/// A numeric measurement entered by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericField {
    /// Model column (e.g. `TOR_LENGTH`).
    pub column: String,
    /// Form prompt.
    pub prompt: String,
    /// Whether the model was trained on this column. Fields with
    /// `in_model = false` are asked for but never reach the model.
    #[serde(default = "default_true")]
    pub in_model: bool,
}

const fn default_true() -> bool {
    true
}

/// A categorical field expanded to one indicator column per option.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoricalField {
    /// Field name, also the prefix of every option column.
    pub field: String,
    /// Form prompt.
    pub prompt: String,
    /// Allowed values in menu order.
    pub options: Vec<CategoricalOption>,
}

/// One allowed value of a categorical field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoricalOption {
    /// Label shown to and selected by the user.
    pub label: String,
    /// Indicator column set to 1 when this option is selected.
    pub column: String,
}

impl CategoricalField {
    /// Finds the option with the given label.
    #[must_use]
    pub fn option(&self, label: &str) -> Option<&CategoricalOption> {
        self.options.iter().find(|o| o.label == label)
    }

    /// Option labels in menu order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }
}

impl DisasterSchema {
    /// Returns `true` if `state` is one of this disaster's recorded states.
    ///
    /// The state is title-cased first and then matched exactly, so
    /// `"new york"` and `"NEW YORK"` match `New York` but `"NewYork"` does
    /// not.
    #[must_use]
    pub fn is_state_valid(&self, state: &str) -> bool {
        let canonical = title_case(state);
        self.states.iter().any(|s| *s == canonical)
    }

    /// The `State_<Name>` indicator columns in declaration order.
    #[must_use]
    pub fn state_columns(&self) -> Vec<String> {
        self.states
            .iter()
            .map(|s| columns::state_column(s))
            .collect()
    }

    /// Numeric fields that are part of the model layout.
    pub fn model_numeric(&self) -> impl Iterator<Item = &NumericField> {
        self.numeric.iter().filter(|f| f.in_model)
    }

    /// Looks up a numeric field by column.
    #[must_use]
    pub fn numeric_field(&self, column: &str) -> Option<&NumericField> {
        self.numeric.iter().find(|f| f.column == column)
    }

    /// Looks up a categorical field by name.
    #[must_use]
    pub fn categorical_field(&self, field: &str) -> Option<&CategoricalField> {
        self.categorical.iter().find(|f| f.field == field)
    }

    /// The exact column set the model for this disaster expects.
    #[must_use]
    pub fn expected_columns(&self) -> BTreeSet<String> {
        columns::COMMON
            .iter()
            .map(|c| (*c).to_string())
            .chain(self.model_numeric().map(|f| f.column.clone()))
            .chain(
                self.categorical
                    .iter()
                    .flat_map(|f| f.options.iter().map(|o| o.column.clone())),
            )
            .chain(self.state_columns())
            .collect()
    }

    /// Checks the internal consistency of the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if a column is declared twice, an option
    /// column does not carry its field prefix, a field has duplicate or no
    /// options, a state is not title-cased, or no states are declared.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let disaster = self.disaster;

        if self.states.is_empty() {
            return Err(SchemaError::NoStates { disaster });
        }

        for state in &self.states {
            if title_case(state) != *state {
                return Err(SchemaError::NonCanonicalState {
                    disaster,
                    state: state.clone(),
                });
            }
        }

        for field in &self.categorical {
            if field.options.is_empty() {
                return Err(SchemaError::InvalidOptions {
                    disaster,
                    field: field.field.clone(),
                    message: "no options declared".to_string(),
                });
            }

            let prefix = format!("{}_", field.field);
            let mut labels = HashSet::new();
            for option in &field.options {
                if !option.column.starts_with(&prefix) {
                    return Err(SchemaError::OptionPrefix {
                        disaster,
                        field: field.field.clone(),
                        column: option.column.clone(),
                    });
                }
                if !labels.insert(option.label.as_str()) {
                    return Err(SchemaError::InvalidOptions {
                        disaster,
                        field: field.field.clone(),
                        message: format!("label '{}' repeated", option.label),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        let all_columns = columns::COMMON
            .iter()
            .map(|c| (*c).to_string())
            .chain(self.numeric.iter().map(|f| f.column.clone()))
            .chain(
                self.categorical
                    .iter()
                    .flat_map(|f| f.options.iter().map(|o| o.column.clone())),
            )
            .chain(self.state_columns());

        for column in all_columns {
            if !seen.insert(column.clone()) {
                return Err(SchemaError::DuplicateColumn { disaster, column });
            }
        }

        Ok(())
    }
}

/// Parses and validates a schema TOML document.
///
/// # Errors
///
/// Returns [`SchemaError`] if the document is malformed or inconsistent.
pub fn parse_schema_toml(toml_str: &str) -> Result<DisasterSchema, SchemaError> {
    let schema: DisasterSchema = toml::from_str(toml_str)?;
    schema.validate()?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
disaster = "Flood"
states = ["Texas", "New York"]

[[numeric]]
column = "Distance_km"
prompt = "Distance"

[[categorical]]
field = "FLOOD_CAUSE"
prompt = "Cause"
options = [
  { label = "Ice Jam", column = "FLOOD_CAUSE_Ice Jam" },
  { label = "Dam Release", column = "FLOOD_CAUSE_Planned Dam Release" },
]
"#;

    #[test]
    fn parses_minimal_schema() {
        let schema = parse_schema_toml(MINIMAL).unwrap();
        assert_eq!(schema.disaster, DisasterType::Flood);
        assert!(schema.numeric[0].in_model);
        assert_eq!(
            schema
                .categorical_field("FLOOD_CAUSE")
                .unwrap()
                .option("Dam Release")
                .unwrap()
                .column,
            "FLOOD_CAUSE_Planned Dam Release"
        );
    }

    #[test]
    fn expected_columns_cover_every_group() {
        let schema = parse_schema_toml(MINIMAL).unwrap();
        let columns = schema.expected_columns();
        assert_eq!(columns.len(), 8 + 1 + 2 + 2);
        assert!(columns.contains("Year"));
        assert!(columns.contains("Distance_km"));
        assert!(columns.contains("FLOOD_CAUSE_Ice Jam"));
        assert!(columns.contains("State_New York"));
    }

    #[test]
    fn state_check_title_cases_then_matches_exactly() {
        let schema = parse_schema_toml(MINIMAL).unwrap();
        assert!(schema.is_state_valid("Texas"));
        assert!(schema.is_state_valid("texas"));
        assert!(schema.is_state_valid("NEW YORK"));
        assert!(!schema.is_state_valid("NewYork"));
        assert!(!schema.is_state_valid(" Texas"));
        assert!(!schema.is_state_valid("Arizona"));
    }

    #[test]
    fn rejects_option_without_prefix() {
        let toml_str = MINIMAL.replace("FLOOD_CAUSE_Ice Jam", "CAUSE_Ice Jam");
        assert!(matches!(
            parse_schema_toml(&toml_str),
            Err(SchemaError::OptionPrefix { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let toml_str = MINIMAL.replace("column = \"Distance_km\"", "column = \"Year\"");
        assert!(matches!(
            parse_schema_toml(&toml_str),
            Err(SchemaError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn rejects_non_canonical_states() {
        let toml_str = MINIMAL.replace("\"New York\"", "\"new york\"");
        assert!(matches!(
            parse_schema_toml(&toml_str),
            Err(SchemaError::NonCanonicalState { .. })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let toml_str = format!("{MINIMAL}\n[extra]\nkey = 1\n");
        assert!(matches!(parse_schema_toml(&toml_str), Err(SchemaError::Parse(_))));
    }
}
