//! Feature vector assembly.
//!
//! [`build`] is a pure function of the schema, the scenario and the county
//! attributes. Its output key set always equals
//! [`DisasterSchema::expected_columns`].

use damage_map_disaster_models::{
    FeatureVector, ScenarioInputs, columns,
    inputs::{MAX_DURATION_HOURS, MIN_DURATION_HOURS},
};
use damage_map_geography_models::{
    CountyAttributes, FIRST_HISTORICAL_YEAR, MAX_SCENARIO_YEAR, states::title_case,
};

use crate::{FeatureError, schema::DisasterSchema};

const ONE: f64 = 1.0;
const ZERO: f64 = 0.0;

/// Builds the model input row for one scenario and one county.
///
/// # Errors
///
/// * [`FeatureError::UnsupportedState`] if the state has no recorded events
///   of this disaster type.
/// * [`FeatureError::InvalidInput`] if the year, duration, a measurement or
///   a county attribute is out of range.
/// * [`FeatureError::UnexpectedMeasurement`] /
///   [`FeatureError::UnknownCategoricalField`] if the scenario carries
///   values the schema does not declare.
/// * [`FeatureError::MissingMeasurement`] /
///   [`FeatureError::MissingCategoricalValue`] /
///   [`FeatureError::UnknownCategoricalValue`] if a model input is absent or
///   not one of the allowed options.
pub fn build(
    schema: &DisasterSchema,
    inputs: &ScenarioInputs,
    county: CountyAttributes,
) -> Result<FeatureVector, FeatureError> {
    let disaster = schema.disaster;

    if !schema.is_state_valid(&inputs.state) {
        return Err(FeatureError::UnsupportedState {
            disaster,
            state: inputs.state.clone(),
        });
    }

    validate_scenario(schema, inputs)?;
    require_finite_non_negative(columns::GDP_PER_CAPITA, county.gdp_per_capita)?;
    require_finite_non_negative(columns::DENSITY, county.density)?;

    let mut vector = FeatureVector::new();

    vector.insert(columns::YEAR, f64::from(inputs.year));
    vector.insert(
        columns::INJURIES_DIRECT,
        f64::from(inputs.casualties.injuries_direct),
    );
    vector.insert(
        columns::INJURIES_INDIRECT,
        f64::from(inputs.casualties.injuries_indirect),
    );
    vector.insert(
        columns::DEATHS_DIRECT,
        f64::from(inputs.casualties.deaths_direct),
    );
    vector.insert(
        columns::DEATHS_INDIRECT,
        f64::from(inputs.casualties.deaths_indirect),
    );
    vector.insert(columns::DURATION_HOURS, f64::from(inputs.duration_hours));
    vector.insert(columns::GDP_PER_CAPITA, county.gdp_per_capita);
    vector.insert(columns::DENSITY, county.density);

    for field in schema.model_numeric() {
        let Some(&value) = inputs.measurements.get(&field.column) else {
            return Err(FeatureError::MissingMeasurement {
                column: field.column.clone(),
            });
        };
        vector.insert(field.column.as_str(), value);
    }

    for field in &schema.categorical {
        let Some(label) = inputs.selections.get(&field.field) else {
            return Err(FeatureError::MissingCategoricalValue {
                field: field.field.clone(),
            });
        };

        if field.option(label).is_none() {
            return Err(FeatureError::UnknownCategoricalValue {
                field: field.field.clone(),
                value: label.clone(),
            });
        }

        for option in &field.options {
            let hot = if option.label == *label { ONE } else { ZERO };
            vector.insert(option.column.as_str(), hot);
        }
    }

    let selected_state = title_case(&inputs.state);
    for state in &schema.states {
        let hot = if *state == selected_state { ONE } else { ZERO };
        vector.insert(columns::state_column(state), hot);
    }

    log::debug!(
        "Built {disaster} feature vector with {} columns for {selected_state}",
        vector.len()
    );

    Ok(vector)
}

fn validate_scenario(schema: &DisasterSchema, inputs: &ScenarioInputs) -> Result<(), FeatureError> {
    if !(FIRST_HISTORICAL_YEAR..=MAX_SCENARIO_YEAR).contains(&inputs.year) {
        return Err(FeatureError::InvalidInput {
            field: columns::YEAR.to_string(),
            message: format!(
                "{} is outside {FIRST_HISTORICAL_YEAR}-{MAX_SCENARIO_YEAR}",
                inputs.year
            ),
        });
    }

    if !(MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&inputs.duration_hours) {
        return Err(FeatureError::InvalidInput {
            field: columns::DURATION_HOURS.to_string(),
            message: format!(
                "{} hours is outside {MIN_DURATION_HOURS}-{MAX_DURATION_HOURS}",
                inputs.duration_hours
            ),
        });
    }

    for (column, value) in &inputs.measurements {
        if schema.numeric_field(column).is_none() {
            return Err(FeatureError::UnexpectedMeasurement {
                disaster: schema.disaster,
                column: column.clone(),
            });
        }
        require_finite_non_negative(column, *value)?;
    }

    for field in inputs.selections.keys() {
        if schema.categorical_field(field).is_none() {
            return Err(FeatureError::UnknownCategoricalField {
                disaster: schema.disaster,
                field: field.clone(),
            });
        }
    }

    Ok(())
}

fn require_finite_non_negative(field: &str, value: f64) -> Result<(), FeatureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FeatureError::InvalidInput {
            field: field.to_string(),
            message: format!("{value} must be a finite, non-negative number"),
        })
    }
}
