//! Scenario pipeline shared by the interactive form and `damage_map predict`.
//!
//! A [`Session`] loads the reference data, the schema registry and the
//! models once. [`Session::run_scenario`] then chains validation ->
//! attribute lookup -> feature build -> point prediction -> county batch ->
//! choropleth for each request.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use damage_map_choropleth::{ChoroplethError, build_feature_collection, write_geojson};
use damage_map_cli_utils::{IndicatifProgress, MultiProgress};
use damage_map_disaster::{FeatureError, features, registry::SchemaRegistry};
use damage_map_disaster_models::{DisasterType, ScenarioInputs};
use damage_map_geography::{
    GeographyError,
    boundaries::{MapCounty, load_map_counties},
    panel::CountyPanel,
    paths,
};
use damage_map_geography_models::FutureYearSource;
use damage_map_prediction::{
    CountyPrediction, PredictionError, PredictionService, predict_all, progress::ProgressCallback,
};
use geojson::FeatureCollection;
use thiserror::Error;

/// File name of the generated choropleth.
pub const OUTPUT_FILE: &str = "predicted_damage.geojson";

/// Errors surfaced to the user. The first four are recoverable: the message
/// is printed and the session continues.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// No panel record for the county and year.
    #[error("{0}")]
    InvalidGeography(#[source] GeographyError),

    /// The state has no recorded events of the disaster type.
    #[error("{0}")]
    UnsupportedStateForDisaster(#[source] FeatureError),

    /// Feature assembly, model lookup or inference failed.
    #[error("Error making prediction: {0}")]
    ModelInferenceFailure(String),

    /// The state has no counties in the panel.
    #[error("{0}")]
    MissingCountyCount(#[source] GeographyError),

    /// Reference data could not be loaded.
    #[error("Failed to load reference data: {0}")]
    ReferenceData(#[source] GeographyError),

    /// Model files could not be loaded.
    #[error("Failed to load models: {0}")]
    Models(#[source] PredictionError),

    /// The map could not be built or written.
    #[error("Failed to write map: {0}")]
    Output(#[from] ChoroplethError),

    /// I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScenarioError {
    /// Returns `true` for the errors the interactive session recovers from.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidGeography(_)
                | Self::UnsupportedStateForDisaster(_)
                | Self::ModelInferenceFailure(_)
                | Self::MissingCountyCount(_)
        )
    }
}

impl From<FeatureError> for ScenarioError {
    fn from(e: FeatureError) -> Self {
        match e {
            FeatureError::UnsupportedState { .. } => Self::UnsupportedStateForDisaster(e),
            other => Self::ModelInferenceFailure(other.to_string()),
        }
    }
}

impl From<PredictionError> for ScenarioError {
    fn from(e: PredictionError) -> Self {
        Self::ModelInferenceFailure(e.to_string())
    }
}

/// One what-if request.
#[derive(Debug, Clone)]
pub struct ScenarioRequest {
    /// Selected disaster type.
    pub disaster: DisasterType,
    /// Selected county (panel name).
    pub county: String,
    /// Scenario values; `inputs.state` is the panel state name.
    pub inputs: ScenarioInputs,
    /// County attribute source for years after the panel ends.
    pub future: FutureYearSource,
}

/// Result of a scenario run.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Predicted damage for the selected county, in dollars.
    pub damage: f64,
    /// Predicted damage for every map county, in map order.
    pub predictions: Vec<CountyPrediction>,
    /// Styled choropleth of `predictions`.
    pub map: FeatureCollection,
}

/// Reference data, schemas and models for one session. Immutable after
/// load.
#[derive(Debug)]
pub struct Session {
    registry: SchemaRegistry,
    panel: CountyPanel,
    counties: Vec<MapCounty>,
    service: PredictionService,
}

/// Where a session reads its inputs from.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    /// Directory with the panel and boundary tables.
    pub data_dir: PathBuf,
    /// Directory with the model files.
    pub models_dir: PathBuf,
}

impl SessionPaths {
    /// Resolves directories from flags, falling back to the environment and
    /// workspace defaults.
    #[must_use]
    pub fn resolve(data_dir: Option<PathBuf>, models_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.unwrap_or_else(paths::data_dir),
            models_dir: models_dir.unwrap_or_else(paths::models_dir),
        }
    }

    /// Default choropleth output path.
    #[must_use]
    pub fn default_output(&self) -> PathBuf {
        paths::generated_dir(&self.data_dir).join(OUTPUT_FILE)
    }
}

impl Session {
    /// Assembles a session from already-loaded parts.
    #[must_use]
    pub const fn new(
        registry: SchemaRegistry,
        panel: CountyPanel,
        counties: Vec<MapCounty>,
        service: PredictionService,
    ) -> Self {
        Self {
            registry,
            panel,
            counties,
            service,
        }
    }

    /// Loads the panel, the county boundaries and the models.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::ReferenceData`] or [`ScenarioError::Models`]
    /// if any input cannot be loaded.
    pub fn load(paths: &SessionPaths, multi: &MultiProgress) -> Result<Self, ScenarioError> {
        let start = Instant::now();
        let steps = IndicatifProgress::steps_bar(multi, "Loading", 3);

        steps.set_message("Loading county panel".to_string());
        let panel = CountyPanel::load(&paths::panel_path(&paths.data_dir))
            .map_err(ScenarioError::ReferenceData)?;
        steps.inc(1);

        steps.set_message("Loading county boundaries".to_string());
        let counties = load_map_counties(&paths::boundaries_path(&paths.data_dir))
            .map_err(ScenarioError::ReferenceData)?;
        steps.inc(1);

        steps.set_message("Loading models".to_string());
        let service = PredictionService::load(&paths.models_dir)
            .map_err(ScenarioError::Models)?;
        steps.inc(1);

        steps.finish_and_clear();
        let models: Vec<String> = service.loaded().map(|d| d.to_string()).collect();
        log::info!(
            "Session ready: {} panel records (through {}), {} map counties, models: [{}]",
            panel.len(),
            panel.latest_year().unwrap_or_default(),
            counties.len(),
            models.join(", ")
        );
        log::debug!("Session loaded in {:.1}s", start.elapsed().as_secs_f64());

        let registry = SchemaRegistry::embedded();
        Ok(Self::new(registry, panel, counties, service))
    }

    /// Schema registry.
    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// County-year panel.
    #[must_use]
    pub const fn panel(&self) -> &CountyPanel {
        &self.panel
    }

    /// Returns `true` if a model is loaded for the disaster type.
    #[must_use]
    pub fn has_model(&self, disaster: DisasterType) -> bool {
        self.service.has_model(disaster)
    }

    /// Runs one scenario end to end.
    ///
    /// # Errors
    ///
    /// Returns one of the four recoverable [`ScenarioError`] kinds, or
    /// [`ScenarioError::Output`] if the map cannot be assembled.
    pub fn run_scenario(
        &self,
        request: &ScenarioRequest,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<ScenarioOutcome, ScenarioError> {
        let disaster = request.disaster;
        let state = request.inputs.state.as_str();

        self.panel
            .counties(state)
            .map_err(ScenarioError::MissingCountyCount)?;

        self.registry.ensure_state_valid(disaster, state)?;

        let attributes = self
            .panel
            .attributes_for(state, &request.county, request.inputs.year, request.future)
            .map_err(ScenarioError::InvalidGeography)?;

        let schema = self.registry.schema_for(disaster);
        let vector = features::build(schema, &request.inputs, attributes)?;

        let damage = self.service.predict(disaster, &vector)?;
        log::info!(
            "{disaster} in {}, {state} ({}): {damage:.2}",
            request.county,
            request.inputs.year
        );

        let predictions = predict_all(&self.service, disaster, &vector, &self.counties, progress)?;
        let map = build_feature_collection(&self.counties, &predictions)?;

        Ok(ScenarioOutcome {
            damage,
            predictions,
            map,
        })
    }
}

/// Writes the choropleth, creating the parent directory.
///
/// # Errors
///
/// Returns [`ScenarioError`] if the directory or file cannot be written.
pub fn write_map(path: &Path, outcome: &ScenarioOutcome) -> Result<(), ScenarioError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }
    write_geojson(path, &outcome.map)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use damage_map_disaster_models::Casualties;
    use damage_map_geography::boundaries::read_map_counties;
    use damage_map_geography_models::CountyAttributes;
    use damage_map_prediction::{
        linear::LinearModel, progress::null_progress, service::raw_to_dollars,
    };

    use super::*;

    const PANEL_CSV: &str = "\
State,County,Year,GDP_per_capita,Density
Texas,Travis,2014,40000,100
Texas,Travis,2022,45000,120
Texas,Harris,2022,61000,1100
Arizona,Pima,2022,38000,44
";

    const MAP_CSV: &str = "\
GEOID,NAME,geometry,GDP_per_capita,Density
48453,Travis,\"POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))\",45000,120
48201,Harris,\"POLYGON ((2 0, 3 0, 3 1, 2 1, 2 0))\",61000,1100
04019,Pima,\"POLYGON ((0 2, 1 2, 1 3, 0 3, 0 2))\",38000,44
";

    /// Scores `1e-4 * GDP + 1e-3 * Density` over the schema's columns.
    fn model_for(registry: &SchemaRegistry, disaster: DisasterType) -> Box<LinearModel> {
        let coefficients = registry
            .schema_for(disaster)
            .expected_columns()
            .into_iter()
            .map(|column| {
                let weight = match column.as_str() {
                    "GDP_per_capita" => 1e-4,
                    "Density" => 1e-3,
                    _ => 0.0,
                };
                (column, weight)
            });
        Box::new(LinearModel::new(0.0, coefficients))
    }

    fn session() -> Session {
        let registry = SchemaRegistry::embedded();
        let service = PredictionService::new()
            .with_model(
                DisasterType::HighWind,
                model_for(&registry, DisasterType::HighWind),
            )
            .with_model(
                DisasterType::TropicalDepression,
                model_for(&registry, DisasterType::TropicalDepression),
            );
        Session::new(
            registry,
            CountyPanel::from_reader(PANEL_CSV.as_bytes()).unwrap(),
            read_map_counties(MAP_CSV.as_bytes()).unwrap(),
            service,
        )
    }

    fn high_wind_request(year: i32, future: FutureYearSource) -> ScenarioRequest {
        ScenarioRequest {
            disaster: DisasterType::HighWind,
            county: "Travis".to_string(),
            inputs: ScenarioInputs::new("Texas", year)
                .with_casualties(Casualties {
                    injuries_direct: 2,
                    ..Casualties::default()
                })
                .with_duration(10)
                .with_measurement("MAGNITUDE", 55.0),
            future,
        }
    }

    #[test]
    fn high_wind_texas_scenario() {
        let session = session();
        let outcome = session
            .run_scenario(
                &high_wind_request(2022, FutureYearSource::LatestRecorded),
                &null_progress(),
            )
            .unwrap();

        let expected = raw_to_dollars(45_000.0 * 1e-4 + 120.0 * 1e-3).unwrap();
        assert!((outcome.damage - expected).abs() < 1e-6);

        assert_eq!(outcome.predictions.len(), 3);
        assert_eq!(outcome.map.features.len(), 3);
        let harris = raw_to_dollars(61_000.0 * 1e-4 + 1_100.0 * 1e-3).unwrap();
        assert!((outcome.predictions[1].damage - harris).abs() < 1e-6);
    }

    #[test]
    fn future_year_reuses_latest_record() {
        let session = session();
        let current = session
            .run_scenario(
                &high_wind_request(2022, FutureYearSource::LatestRecorded),
                &null_progress(),
            )
            .unwrap();
        let future = session
            .run_scenario(
                &high_wind_request(2025, FutureYearSource::LatestRecorded),
                &null_progress(),
            )
            .unwrap();

        assert!((current.damage - future.damage).abs() < 1e-9);
    }

    #[test]
    fn future_year_accepts_manual_attributes() {
        let session = session();
        let manual = FutureYearSource::Manual(CountyAttributes {
            gdp_per_capita: 10_000.0,
            density: 0.0,
        });
        let outcome = session
            .run_scenario(&high_wind_request(2030, manual), &null_progress())
            .unwrap();
        assert!((outcome.damage - raw_to_dollars(1.0).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn unsupported_state_is_reported() {
        let session = session();
        let request = ScenarioRequest {
            disaster: DisasterType::TropicalDepression,
            county: "Pima".to_string(),
            inputs: ScenarioInputs::new("Arizona", 2022),
            future: FutureYearSource::LatestRecorded,
        };

        let err = session
            .run_scenario(&request, &null_progress())
            .unwrap_err();
        assert!(matches!(err, ScenarioError::UnsupportedStateForDisaster(_)));
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "There have not been any recorded tropical depression in the State of Arizona since 2007"
        );
    }

    #[test]
    fn missing_year_is_invalid_geography() {
        let session = session();
        let err = session
            .run_scenario(
                &high_wind_request(2015, FutureYearSource::LatestRecorded),
                &null_progress(),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No GDP or Density data found for Travis, Texas in the year 2015."
        );
    }

    #[test]
    fn state_without_counties() {
        let session = session();
        let mut request = high_wind_request(2022, FutureYearSource::LatestRecorded);
        request.inputs.state = "Ohio".to_string();

        let err = session
            .run_scenario(&request, &null_progress())
            .unwrap_err();
        assert!(matches!(err, ScenarioError::MissingCountyCount(_)));
        assert_eq!(
            err.to_string(),
            "No counties found for the selected state: Ohio"
        );
    }

    #[test]
    fn missing_model_is_inference_failure() {
        let session = session();
        assert!(session.has_model(DisasterType::HighWind));
        assert!(!session.has_model(DisasterType::Lightning));

        let request = ScenarioRequest {
            disaster: DisasterType::Lightning,
            county: "Travis".to_string(),
            inputs: ScenarioInputs::new("Texas", 2022).with_measurement("Distance_km", 3.0),
            future: FutureYearSource::LatestRecorded,
        };

        let err = session
            .run_scenario(&request, &null_progress())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error making prediction: No model loaded for Lightning"
        );
    }

    #[test]
    fn invalid_inputs_surface_as_prediction_errors() {
        let session = session();
        let mut request = high_wind_request(2022, FutureYearSource::LatestRecorded);
        request.inputs.measurements.clear();

        let err = session
            .run_scenario(&request, &null_progress())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error making prediction: Missing value for MAGNITUDE"
        );
    }

    #[test]
    fn default_output_is_under_generated() {
        let paths = SessionPaths::resolve(Some(PathBuf::from("/tmp/data")), None);
        assert_eq!(
            paths.default_output(),
            Path::new("/tmp/data/generated/predicted_damage.geojson")
        );
    }
}
