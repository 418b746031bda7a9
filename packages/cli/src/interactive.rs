//! Interactive scenario form.
//!
//! Walks the user through disaster type, location, year, casualties and
//! the disaster-specific measurements with `dialoguer` prompts, runs the
//! scenario and writes the map. Loops until the user declines another run.

use std::path::Path;

use damage_map_cli_utils::{IndicatifProgress, MultiProgress};
use damage_map_disaster::schema::DisasterSchema;
use damage_map_disaster_models::{
    Casualties, DisasterType, ScenarioInputs,
    inputs::{DEFAULT_DURATION_HOURS, MAX_DURATION_HOURS, MIN_DURATION_HOURS},
};
use damage_map_geography_models::{
    CountyAttributes, FIRST_HISTORICAL_YEAR, FutureYearSource, LAST_HISTORICAL_YEAR,
    MAX_SCENARIO_YEAR,
};
use damage_map_prediction::format_dollars;
use dialoguer::{Confirm, Input, Select};

use crate::pipeline::{ScenarioError, ScenarioRequest, Session, write_map};

/// How county attributes are supplied for a year after the panel ends.
enum FutureChoice {
    Manual,
    Predicted,
}

impl FutureChoice {
    const ALL: &[Self] = &[Self::Manual, Self::Predicted];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Enter manually",
            Self::Predicted => "Use predicted data",
        }
    }
}

/// Runs the interactive form until the user is done.
///
/// Recoverable scenario errors are printed and the user is offered another
/// run.
///
/// # Errors
///
/// Returns an error if a prompt fails or the map cannot be written.
pub fn run(
    session: &Session,
    output: &Path,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Disaster Damage Map");
    println!();

    loop {
        match prompt_and_run(session, output, multi) {
            Ok(()) => {}
            Err(e) => match e.downcast_ref::<ScenarioError>() {
                Some(scenario) if scenario.is_recoverable() => println!("{scenario}"),
                _ => return Err(e),
            },
        }

        println!();
        let again = Confirm::new()
            .with_prompt("Run another scenario?")
            .default(true)
            .interact()?;
        if !again {
            return Ok(());
        }
    }
}

fn prompt_and_run(
    session: &Session,
    output: &Path,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let disaster = prompt_disaster()?;
    if !session.has_model(disaster) {
        log::warn!("No {disaster} model is loaded; the prediction will fail");
    }

    let states = session.panel().states();
    let state_idx = Select::new()
        .with_prompt("Select a state")
        .items(&states)
        .default(0)
        .interact()?;
    let state = states[state_idx].to_string();

    let counties = session
        .panel()
        .counties(&state)
        .map_err(ScenarioError::MissingCountyCount)?;
    let county_idx = Select::new()
        .with_prompt("Select a county")
        .items(&counties)
        .default(0)
        .interact()?;
    let county = counties[county_idx].to_string();

    session
        .registry()
        .ensure_state_valid(disaster, &state)
        .map_err(ScenarioError::from)?;

    let year_prompt = format!("Year ({FIRST_HISTORICAL_YEAR}-{MAX_SCENARIO_YEAR})");
    let year: i32 = Input::new()
        .with_prompt(year_prompt)
        .default(LAST_HISTORICAL_YEAR)
        .validate_with(|y: &i32| {
            if (FIRST_HISTORICAL_YEAR..=MAX_SCENARIO_YEAR).contains(y) {
                Ok(())
            } else {
                Err(format!("Year must be {FIRST_HISTORICAL_YEAR}-{MAX_SCENARIO_YEAR}"))
            }
        })
        .interact_text()?;

    let future = if year > LAST_HISTORICAL_YEAR {
        prompt_future_source()?
    } else {
        FutureYearSource::LatestRecorded
    };

    let casualties = Casualties {
        injuries_direct: prompt_count("Number of direct injuries")?,
        injuries_indirect: prompt_count("Number of indirect injuries")?,
        deaths_direct: prompt_count("Number of direct deaths")?,
        deaths_indirect: prompt_count("Number of indirect deaths")?,
    };

    let duration: u32 = Input::new()
        .with_prompt(format!(
            "Disaster duration in hours ({MIN_DURATION_HOURS}-{MAX_DURATION_HOURS})"
        ))
        .default(DEFAULT_DURATION_HOURS)
        .validate_with(|h: &u32| {
            if (MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(h) {
                Ok(())
            } else {
                Err(format!(
                    "Duration must be between {MIN_DURATION_HOURS} and {MAX_DURATION_HOURS} hours"
                ))
            }
        })
        .interact_text()?;

    let schema = session.registry().schema_for(disaster);
    let inputs = prompt_disaster_fields(
        schema,
        ScenarioInputs::new(state, year)
            .with_casualties(casualties)
            .with_duration(duration),
    )?;

    let request = ScenarioRequest {
        disaster,
        county,
        inputs,
        future,
    };

    let progress = IndicatifProgress::batch_bar(multi, "Predicting county damage");
    let outcome = session.run_scenario(&request, &progress)?;

    println!();
    println!("Predicted Damage: {}", format_dollars(outcome.damage));

    write_map(output, &outcome)?;
    println!("Map written to {}", output.display());

    Ok(())
}

fn prompt_disaster() -> Result<DisasterType, Box<dyn std::error::Error>> {
    let labels: Vec<String> = DisasterType::all()
        .iter()
        .map(ToString::to_string)
        .collect();

    let idx = Select::new()
        .with_prompt("Select a disaster type")
        .items(&labels)
        .default(0)
        .interact()?;

    let disaster = DisasterType::all()[idx];
    println!("Definition: {}", disaster.definition());
    Ok(disaster)
}

fn prompt_future_source() -> Result<FutureYearSource, Box<dyn std::error::Error>> {
    println!("You have selected a year beyond {LAST_HISTORICAL_YEAR}.");
    println!("Enter the county values manually or use predicted data.");

    let labels: Vec<&str> = FutureChoice::ALL.iter().map(FutureChoice::label).collect();
    let idx = Select::new()
        .with_prompt("How do you want to provide GDP per capita and Density?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match FutureChoice::ALL[idx] {
        FutureChoice::Manual => FutureYearSource::Manual(CountyAttributes {
            gdp_per_capita: prompt_non_negative("GDP per capita for the county", 0.0)?,
            density: prompt_non_negative(
                "Population density for the county (people per sq. km)",
                0.0,
            )?,
        }),
        FutureChoice::Predicted => FutureYearSource::LatestRecorded,
    })
}

fn prompt_disaster_fields(
    schema: &DisasterSchema,
    mut inputs: ScenarioInputs,
) -> Result<ScenarioInputs, Box<dyn std::error::Error>> {
    for field in &schema.numeric {
        let value = prompt_non_negative(&field.prompt, 0.0)?;
        inputs = inputs.with_measurement(field.column.as_str(), value);
    }

    for field in &schema.categorical {
        let labels = field.labels();
        let idx = Select::new()
            .with_prompt(&field.prompt)
            .items(&labels)
            .default(0)
            .interact()?;
        inputs = inputs.with_selection(field.field.as_str(), labels[idx]);
    }

    Ok(inputs)
}

fn prompt_count(prompt: &str) -> Result<u32, Box<dyn std::error::Error>> {
    Ok(Input::new()
        .with_prompt(prompt)
        .default(0_u32)
        .interact_text()?)
}

fn prompt_non_negative(prompt: &str, default: f64) -> Result<f64, Box<dyn std::error::Error>> {
    Ok(Input::new()
        .with_prompt(prompt)
        .default(default)
        .validate_with(|v: &f64| {
            if v.is_finite() && *v >= 0.0 {
                Ok(())
            } else {
                Err("Value must be a non-negative number")
            }
        })
        .interact_text()?)
}
