//! Full-map prediction.
//!
//! The scenario's non-geographic columns are fixed; only `GDP_per_capita`
//! and `Density` change from county to county.

use std::sync::Arc;

use damage_map_disaster_models::{DisasterType, FeatureVector};
use damage_map_geography::boundaries::MapCounty;

use crate::{PredictionError, progress::ProgressCallback, service::PredictionService};

/// Predicted damage for one map county.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyPrediction {
    /// [`MapCounty::id`] of the county.
    pub county_id: String,
    /// County display name.
    pub name: String,
    /// Predicted damage in dollars.
    pub damage: f64,
}

/// Predicts damage for every county, in input order.
///
/// For each county the fixed vector is cloned and only its county
/// attributes are replaced. The first failure aborts the batch.
///
/// # Errors
///
/// Returns the first [`PredictionError`] raised by the service, converted to
/// [`PredictionError::ModelInferenceFailure`] with the county named.
pub fn predict_all(
    service: &PredictionService,
    disaster: DisasterType,
    fixed: &FeatureVector,
    counties: &[MapCounty],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<CountyPrediction>, PredictionError> {
    progress.set_total(counties.len() as u64);
    progress.set_message(format!("Predicting {disaster} damage"));

    let mut predictions = Vec::with_capacity(counties.len());

    for county in counties {
        let features = fixed.with_county_attributes(county.attributes);
        let damage = service.predict(disaster, &features).map_err(|e| {
            progress.finish_and_clear();
            PredictionError::ModelInferenceFailure(format!("{} ({}): {e}", county.name, county.id))
        })?;

        predictions.push(CountyPrediction {
            county_id: county.id.clone(),
            name: county.name.clone(),
            damage,
        });
        progress.inc(1);
    }

    log::info!(
        "Predicted {disaster} damage for {} counties",
        predictions.len()
    );
    progress.finish(format!("{} counties", predictions.len()));

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use damage_map_geography_models::CountyAttributes;
    use geo::{MultiPolygon, polygon};

    use super::*;
    use crate::{progress::null_progress, regressor::Regressor};

    /// Echoes `ln(1 + Density)` so the prediction equals the density.
    struct DensityEcho {
        names: Vec<String>,
        seen: Mutex<Vec<FeatureVector>>,
    }

    impl DensityEcho {
        fn new(names: &[&str]) -> Self {
            Self {
                names: names.iter().map(|n| (*n).to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Regressor for Arc<DensityEcho> {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_row(&self, _row: &[f64]) -> f64 {
            unreachable!("predict is overridden")
        }

        fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
            self.seen.lock().unwrap().push(features.clone());
            Ok(features.get("Density").unwrap().ln_1p())
        }
    }

    fn county(id: &str, gdp: f64, density: f64) -> MapCounty {
        MapCounty {
            id: id.to_string(),
            name: format!("{id} County"),
            attributes: CountyAttributes {
                gdp_per_capita: gdp,
                density,
            },
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]]),
        }
    }

    const COLUMNS: &[&str] = &["Year", "GDP_per_capita", "Density", "State_Texas"];

    fn fixed() -> FeatureVector {
        [
            ("Year", 2022.0),
            ("GDP_per_capita", 1.0),
            ("Density", 1.0),
            ("State_Texas", 1.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn one_prediction_per_county_in_order() {
        let echo = Arc::new(DensityEcho::new(COLUMNS));
        let model = Box::new(Arc::clone(&echo));
        let service = PredictionService::new().with_model(DisasterType::HighWind, model);
        let counties = vec![
            county("48453", 60_000.0, 400.0),
            county("48201", 70_000.0, 1_200.0),
            county("48001", 30_000.0, 20.0),
        ];

        let predictions = predict_all(
            &service,
            DisasterType::HighWind,
            &fixed(),
            &counties,
            &null_progress(),
        )
        .unwrap();

        assert_eq!(predictions.len(), 3);
        let ids: Vec<&str> = predictions.iter().map(|p| p.county_id.as_str()).collect();
        assert_eq!(ids, ["48453", "48201", "48001"]);
        assert!((predictions[1].damage - 1_200.0).abs() < 1e-6);
        assert!((predictions[2].damage - 20.0).abs() < 1e-6);
    }

    #[test]
    fn only_county_attributes_vary() {
        let echo = Arc::new(DensityEcho::new(COLUMNS));
        let model = Box::new(Arc::clone(&echo));
        let service = PredictionService::new().with_model(DisasterType::HighWind, model);
        let counties = vec![county("a", 10.0, 5.0), county("b", 20.0, 6.0)];

        predict_all(
            &service,
            DisasterType::HighWind,
            &fixed(),
            &counties,
            &null_progress(),
        )
        .unwrap();

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for (vector, county) in seen.iter().zip(&counties) {
            assert_eq!(vector.get("Year"), Some(2022.0));
            assert_eq!(vector.get("State_Texas"), Some(1.0));
            assert_eq!(
                vector.get("GDP_per_capita"),
                Some(county.attributes.gdp_per_capita)
            );
            assert_eq!(vector.get("Density"), Some(county.attributes.density));
        }
    }

    #[test]
    fn first_failure_aborts_with_county_name() {
        let echo = Arc::new(DensityEcho::new(&["Year"]));
        let model = Box::new(Arc::clone(&echo));
        let service = PredictionService::new().with_model(DisasterType::Flood, model);
        let counties = vec![county("x", 1.0, 1.0)];

        let err = predict_all(
            &service,
            DisasterType::Flood,
            &fixed(),
            &counties,
            &null_progress(),
        )
        .unwrap_err();

        assert!(matches!(err, PredictionError::ModelInferenceFailure(_)));
        assert!(err.to_string().contains("x County"));
        assert!(echo.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_county_list_is_empty_result() {
        let service = PredictionService::new();
        let predictions = predict_all(
            &service,
            DisasterType::Tornado,
            &fixed(),
            &[],
            &null_progress(),
        )
        .unwrap();
        assert!(predictions.is_empty());
    }
}
