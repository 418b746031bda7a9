#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Disaster damage map CLI.
//!
//! Without a subcommand the tool runs the interactive scenario form. The
//! `predict` subcommand runs one scenario non-interactively; `disasters`,
//! `states` and `counties` list the selectable values.
//!
//! Uses `indicatif-log-bridge` (via [`damage_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the county batch bar never fight for the terminal.

mod interactive;
mod pipeline;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use clap::{Parser, Subcommand};
use damage_map_cli_utils::IndicatifProgress;
use damage_map_disaster::registry::SchemaRegistry;
use damage_map_disaster_models::{
    Casualties, DisasterType, ScenarioInputs, inputs::DEFAULT_DURATION_HOURS,
};
use damage_map_geography_models::{CountyAttributes, FutureYearSource, LAST_HISTORICAL_YEAR};
use damage_map_prediction::format_dollars;

use crate::pipeline::{ScenarioRequest, Session, SessionPaths, write_map};

#[derive(Parser)]
#[command(name = "damage_map", about = "Disaster damage prediction tool")]
struct Cli {
    /// Directory with the county panel and boundary tables (overrides
    /// `DAMAGE_MAP_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Directory with the per-disaster model files (overrides
    /// `DAMAGE_MAP_MODELS_DIR`)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict damage for one scenario and write the county map
    Predict {
        /// Disaster type (e.g., "Tornado", "`high_wind`")
        #[arg(long, value_parser = parse_disaster)]
        disaster: DisasterType,
        /// State name or two-letter abbreviation
        #[arg(long)]
        state: String,
        /// County name as listed by `counties`
        #[arg(long)]
        county: String,
        /// Scenario year (2007-2030)
        #[arg(long, default_value_t = LAST_HISTORICAL_YEAR)]
        year: i32,
        /// Number of direct injuries
        #[arg(long, default_value_t = 0)]
        injuries_direct: u32,
        /// Number of indirect injuries
        #[arg(long, default_value_t = 0)]
        injuries_indirect: u32,
        /// Number of direct deaths
        #[arg(long, default_value_t = 0)]
        deaths_direct: u32,
        /// Number of indirect deaths
        #[arg(long, default_value_t = 0)]
        deaths_indirect: u32,
        /// Duration in hours (1-100)
        #[arg(long, default_value_t = DEFAULT_DURATION_HOURS)]
        duration: u32,
        /// Disaster-specific measurement as `COLUMN=VALUE` (repeatable)
        #[arg(long = "measure", value_parser = parse_measurement)]
        measurements: Vec<(String, f64)>,
        /// Disaster-specific selection as `FIELD=LABEL` (repeatable)
        #[arg(long = "select", value_parser = parse_selection)]
        selections: Vec<(String, String)>,
        /// GDP per capita for a year after 2022 (requires `--density`;
        /// rejected for earlier years, which use the recorded values)
        #[arg(long, requires = "density")]
        gdp_per_capita: Option<f64>,
        /// Population density for a year after 2022 (requires
        /// `--gdp-per-capita`; rejected for earlier years)
        #[arg(long, requires = "gdp_per_capita")]
        density: Option<f64>,
        /// Output path for the `GeoJSON` choropleth
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip writing the map
        #[arg(long)]
        no_map: bool,
    },
    /// List disaster types, their definitions and input fields
    Disasters,
    /// List the states in the county panel
    States,
    /// List the counties of a state
    Counties {
        /// State name or two-letter abbreviation
        state: String,
    },
}

fn parse_disaster(s: &str) -> Result<DisasterType, String> {
    DisasterType::from_str(s).map_err(|_| {
        let known: Vec<String> = DisasterType::all()
            .iter()
            .map(ToString::to_string)
            .collect();
        format!(
            "unknown disaster type '{s}' (expected one of: {})",
            known.join(", ")
        )
    })
}

fn split_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_measurement(s: &str) -> Result<(String, f64), String> {
    let (column, value) = split_pair(s)?;
    let value = value
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {column}: {e}"))?;
    Ok((column, value))
}

fn parse_selection(s: &str) -> Result<(String, String), String> {
    split_pair(s)
}

/// Resolves the county attribute source for `predict`. Manual values are
/// only accepted for years after the panel ends.
fn future_source(
    year: i32,
    gdp_per_capita: Option<f64>,
    density: Option<f64>,
) -> Result<FutureYearSource, String> {
    match (gdp_per_capita, density) {
        (None, None) => Ok(FutureYearSource::LatestRecorded),
        _ if year <= LAST_HISTORICAL_YEAR => Err(format!(
            "--gdp-per-capita and --density only apply after {LAST_HISTORICAL_YEAR} (got {year})"
        )),
        (Some(gdp_per_capita), Some(density)) => {
            let attributes = CountyAttributes {
                gdp_per_capita,
                density,
            };
            Ok(FutureYearSource::Manual(attributes))
        }
        _ => Err("--gdp-per-capita and --density must be given together".to_string()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = damage_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let paths = SessionPaths::resolve(cli.data_dir, cli.models_dir);

    let Some(command) = cli.command else {
        let session = Session::load(&paths, &multi)?;
        return interactive::run(&session, &paths.default_output(), &multi);
    };

    match command {
        Commands::Predict {
            disaster,
            state,
            county,
            year,
            injuries_direct,
            injuries_indirect,
            deaths_direct,
            deaths_indirect,
            duration,
            measurements,
            selections,
            gdp_per_capita,
            density,
            output,
            no_map,
        } => {
            let start = Instant::now();
            let future = future_source(year, gdp_per_capita, density)?;
            let session = Session::load(&paths, &multi)?;

            let state = session
                .panel()
                .find_state(&state)
                .ok_or_else(|| format!("Unknown state: {state}"))?
                .to_string();
            let county = session
                .panel()
                .find_county(&state, &county)
                .ok_or_else(|| format!("Unknown county: {county}, {state}"))?
                .to_string();

            let mut inputs = ScenarioInputs::new(state, year)
                .with_casualties(Casualties {
                    injuries_direct,
                    injuries_indirect,
                    deaths_direct,
                    deaths_indirect,
                })
                .with_duration(duration);
            for (column, value) in measurements {
                inputs = inputs.with_measurement(column, value);
            }
            for (field, label) in selections {
                inputs = inputs.with_selection(field, label);
            }

            let request = ScenarioRequest {
                disaster,
                county,
                inputs,
                future,
            };
            let progress = IndicatifProgress::batch_bar(&multi, "Predicting county damage");
            let outcome = session.run_scenario(&request, &progress)?;

            println!("Predicted Damage: {}", format_dollars(outcome.damage));

            if !no_map {
                let output = output.unwrap_or_else(|| paths.default_output());
                write_map(&output, &outcome)?;
                println!("Map written to {}", output.display());
            }

            log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Disasters => {
            let registry = SchemaRegistry::embedded();
            for schema in registry.schemas() {
                println!("{}", schema.disaster);
                println!("  {}", schema.disaster.definition());
                for field in &schema.numeric {
                    println!("  --measure {}=<value>  {}", field.column, field.prompt);
                }
                for field in &schema.categorical {
                    println!("  --select {}=<{}>", field.field, field.labels().join("|"));
                }
                println!("  States: {}", schema.states.join(", "));
                println!();
            }
        }
        Commands::States => {
            let session = Session::load(&paths, &multi)?;
            for state in session.panel().states() {
                println!("{state}");
            }
        }
        Commands::Counties { state } => {
            let session = Session::load(&paths, &multi)?;
            let state = session
                .panel()
                .find_state(&state)
                .ok_or_else(|| format!("Unknown state: {state}"))?;
            for county in session.panel().counties(state)? {
                println!("{county}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_year_uses_recorded_values() {
        let source = future_source(2020, None, None).unwrap();
        assert_eq!(source, FutureYearSource::LatestRecorded);
    }

    #[test]
    fn future_year_takes_manual_values() {
        let source = future_source(2027, Some(45_000.0), Some(120.0)).unwrap();
        assert_eq!(
            source,
            FutureYearSource::Manual(CountyAttributes {
                gdp_per_capita: 45_000.0,
                density: 120.0,
            })
        );
    }

    #[test]
    fn manual_values_rejected_for_historical_year() {
        let err = future_source(LAST_HISTORICAL_YEAR, Some(45_000.0), Some(120.0)).unwrap_err();
        assert_eq!(
            err,
            "--gdp-per-capita and --density only apply after 2022 (got 2022)"
        );
        assert!(future_source(2010, Some(1.0), None).is_err());
    }

    #[test]
    fn manual_values_come_in_pairs() {
        assert!(future_source(2027, None, Some(120.0)).is_err());
    }

    #[test]
    fn predict_flags_parse() {
        let cli = Cli::try_parse_from([
            "damage_map",
            "predict",
            "--disaster",
            "high_wind",
            "--state",
            "TX",
            "--county",
            "Travis",
            "--duration",
            "5",
            "--measure",
            "MAGNITUDE=80",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Predict {
                disaster,
                year,
                duration,
                measurements,
                ..
            }) => {
                assert_eq!(disaster, DisasterType::HighWind);
                assert_eq!(year, LAST_HISTORICAL_YEAR);
                assert_eq!(duration, 5);
                assert_eq!(measurements, vec![("MAGNITUDE".to_string(), 80.0)]);
            }
            _ => panic!("expected the predict subcommand"),
        }
    }

    #[test]
    fn gdp_requires_density() {
        let result = Cli::try_parse_from([
            "damage_map",
            "predict",
            "--disaster",
            "flood",
            "--state",
            "Texas",
            "--county",
            "Travis",
            "--gdp-per-capita",
            "1000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_disaster() {
        let err = parse_disaster("hail").unwrap_err();
        assert!(err.starts_with("unknown disaster type 'hail'"));
        assert!(err.contains("High Wind"));
    }

    #[test]
    fn measurement_pairs() {
        assert_eq!(
            parse_measurement(" TOR_LENGTH = 2.5 ").unwrap(),
            ("TOR_LENGTH".to_string(), 2.5)
        );
        assert!(parse_measurement("TOR_LENGTH").is_err());
        assert!(parse_measurement("TOR_LENGTH=far").is_err());
    }
}
