//! Model column names shared by every disaster type.

/// Scenario year.
pub const YEAR: &str = "Year";
/// Direct injuries.
pub const INJURIES_DIRECT: &str = "INJURIES_DIRECT";
/// Indirect injuries.
pub const INJURIES_INDIRECT: &str = "INJURIES_INDIRECT";
/// Direct deaths.
pub const DEATHS_DIRECT: &str = "DEATHS_DIRECT";
/// Indirect deaths.
pub const DEATHS_INDIRECT: &str = "DEATHS_INDIRECT";
/// Event duration in hours.
pub const DURATION_HOURS: &str = "DURATION_HOURS";
/// County GDP per capita.
pub const GDP_PER_CAPITA: &str = "GDP_per_capita";
/// County population density.
pub const DENSITY: &str = "Density";

/// Prefix of the one-hot state indicator columns.
pub const STATE_PREFIX: &str = "State_";

/// Columns present in every disaster model.
pub const COMMON: &[&str] = &[
    YEAR,
    INJURIES_DIRECT,
    INJURIES_INDIRECT,
    DEATHS_DIRECT,
    DEATHS_INDIRECT,
    DURATION_HOURS,
    GDP_PER_CAPITA,
    DENSITY,
];

/// Columns that depend on the county rather than the scenario.
pub const COUNTY_DEPENDENT: &[&str] = &[GDP_PER_CAPITA, DENSITY];

/// Returns the one-hot column for a canonical (title-cased) state name.
#[must_use]
pub fn state_column(state: &str) -> String {
    format!("{STATE_PREFIX}{state}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_column_keeps_spaces() {
        assert_eq!(state_column("New York"), "State_New York");
        assert_eq!(
            state_column("District Of Columbia"),
            "State_District Of Columbia"
        );
    }

    #[test]
    fn county_dependent_columns_are_common() {
        for column in COUNTY_DEPENDENT {
            assert!(COMMON.contains(column));
        }
    }
}
