//! User-entered scenario inputs.

use std::collections::BTreeMap;

/// Injury and death counts for a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Casualties {
    /// Direct injuries.
    pub injuries_direct: u32,
    /// Indirect injuries.
    pub injuries_indirect: u32,
    /// Direct deaths.
    pub deaths_direct: u32,
    /// Indirect deaths.
    pub deaths_indirect: u32,
}

/// Everything the user enters for one prediction, except the county
/// attributes which are looked up separately.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioInputs {
    /// Selected state, as shown to the user.
    pub state: String,
    /// Scenario year.
    pub year: i32,
    /// Injury and death counts.
    pub casualties: Casualties,
    /// Event duration in hours.
    pub duration_hours: u32,
    /// Disaster-specific measurements keyed by model column
    /// (e.g. `TOR_LENGTH`).
    pub measurements: BTreeMap<String, f64>,
    /// Categorical selections keyed by field name (e.g. `TOR_F_SCALE`),
    /// valued by the option label the user picked.
    pub selections: BTreeMap<String, String>,
}

/// Default event duration offered by the form.
pub const DEFAULT_DURATION_HOURS: u32 = 10;
/// Shortest event duration the form accepts.
pub const MIN_DURATION_HOURS: u32 = 1;
/// Longest event duration the form accepts.
pub const MAX_DURATION_HOURS: u32 = 100;

impl ScenarioInputs {
    /// Creates a scenario with no casualties, the default duration and no
    /// disaster-specific values.
    #[must_use]
    pub fn new(state: impl Into<String>, year: i32) -> Self {
        Self {
            state: state.into(),
            year,
            casualties: Casualties::default(),
            duration_hours: DEFAULT_DURATION_HOURS,
            measurements: BTreeMap::new(),
            selections: BTreeMap::new(),
        }
    }

    /// Sets the casualty counts.
    #[must_use]
    pub const fn with_casualties(mut self, casualties: Casualties) -> Self {
        self.casualties = casualties;
        self
    }

    /// Sets the event duration.
    #[must_use]
    pub const fn with_duration(mut self, hours: u32) -> Self {
        self.duration_hours = hours;
        self
    }

    /// Adds a disaster-specific measurement.
    #[must_use]
    pub fn with_measurement(mut self, column: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(column.into(), value);
        self
    }

    /// Adds a categorical selection.
    #[must_use]
    pub fn with_selection(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.selections.insert(field.into(), label.into());
        self
    }
}
