#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth output for a full-map prediction.
//!
//! Produces a `GeoJSON` `FeatureCollection` with one styled feature per
//! county. Any map renderer can draw it directly: each feature carries its
//! own fill colour and opacity, tooltip labels, and the collection carries
//! the legend and the map centre.

pub mod color;

use std::io::{BufWriter, Write as _};
use std::path::Path;

use damage_map_geography::boundaries::MapCounty;
use damage_map_prediction::{CountyPrediction, format_dollars};
use geo::{BoundingRect, Centroid};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};
use serde_json::json;
use thiserror::Error;

use crate::color::ColorScale;

/// Fill opacity of every county.
pub const FILL_OPACITY: f64 = 0.8;
/// Outline opacity of every county.
pub const LINE_OPACITY: f64 = 0.1;
/// Initial zoom level for the rendered map.
pub const ZOOM_START: u8 = 7;
/// Legend caption.
pub const LEGEND_TITLE: &str = "Predicted Damage";

/// Errors raised while building or writing the map.
#[derive(Debug, Error)]
pub enum ChoroplethError {
    /// Counties and predictions differ in length.
    #[error("{counties} counties but {predictions} predictions")]
    LengthMismatch {
        /// Number of counties.
        counties: usize,
        /// Number of predictions.
        predictions: usize,
    },

    /// A prediction does not belong to the county at the same position.
    #[error("Prediction {index} is for county {found}, expected {expected}")]
    CountyMismatch {
        /// Position in both slices.
        index: usize,
        /// County id of the map county.
        expected: String,
        /// County id of the prediction.
        found: String,
    },

    /// I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Builds the styled feature collection. `predictions` must be the output
/// of the batch predictor for the same `counties`, in the same order.
///
/// # Errors
///
/// Returns [`ChoroplethError`] if the two slices do not line up.
pub fn build_feature_collection(
    counties: &[MapCounty],
    predictions: &[CountyPrediction],
) -> Result<FeatureCollection, ChoroplethError> {
    if counties.len() != predictions.len() {
        return Err(ChoroplethError::LengthMismatch {
            counties: counties.len(),
            predictions: predictions.len(),
        });
    }

    let scale = ColorScale::from_values(predictions.iter().map(|p| p.damage));

    let features = counties
        .iter()
        .zip(predictions)
        .enumerate()
        .map(|(index, (county, prediction))| {
            if county.id != prediction.county_id {
                return Err(ChoroplethError::CountyMismatch {
                    index,
                    expected: county.id.clone(),
                    found: prediction.county_id.clone(),
                });
            }
            Ok(county_feature(county, prediction.damage, &scale))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut foreign_members = JsonObject::new();
    foreign_members.insert(
        "legend".to_string(),
        json!({
            "title": LEGEND_TITLE,
            "min": scale.min(),
            "max": scale.max(),
            "bins": scale.legend(),
        }),
    );
    if let Some((lat, lon)) = mean_centroid(counties) {
        foreign_members.insert(
            "center".to_string(),
            json!({ "lat": lat, "lon": lon, "zoom": ZOOM_START }),
        );
    }

    let bbox = bounding_box(counties);

    Ok(FeatureCollection {
        bbox,
        features,
        foreign_members: Some(foreign_members),
    })
}

fn county_feature(county: &MapCounty, damage: f64, scale: &ColorScale) -> Feature {
    let properties = json!({
        "NAME": county.name,
        "predicted_damage": damage,
        "predicted_damage_label": format_dollars(damage),
        "fill_color": scale.color(damage).to_hex(),
        "fill_opacity": FILL_OPACITY,
        "line_opacity": LINE_OPACITY,
        "tooltip": {
            "fields": ["NAME", "predicted_damage_label"],
            "aliases": ["County:", "Predicted Damage:"],
        },
    });

    let properties = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&county.geometry))),
        id: Some(Id::String(county.id.clone())),
        properties,
        foreign_members: None,
    }
}

/// Mean of the county centroids as `(lat, lon)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_centroid(counties: &[MapCounty]) -> Option<(f64, f64)> {
    let centroids: Vec<_> = counties
        .iter()
        .filter_map(|c| c.geometry.centroid())
        .collect();
    if centroids.is_empty() {
        return None;
    }

    let n = centroids.len() as f64;
    let lat = centroids.iter().map(|p| p.y()).sum::<f64>() / n;
    let lon = centroids.iter().map(|p| p.x()).sum::<f64>() / n;
    Some((lat, lon))
}

/// `[min_x, min_y, max_x, max_y]` over every county geometry.
fn bounding_box(counties: &[MapCounty]) -> Option<Vec<f64>> {
    let mut rects = counties.iter().filter_map(|c| c.geometry.bounding_rect());
    let first = rects.next()?;

    let (mut min, mut max) = (first.min(), first.max());
    for rect in rects {
        min.x = min.x.min(rect.min().x);
        min.y = min.y.min(rect.min().y);
        max.x = max.x.max(rect.max().x);
        max.y = max.y.max(rect.max().y);
    }

    Some(vec![min.x, min.y, max.x, max.y])
}

/// Writes the collection as pretty-printed `GeoJSON`.
///
/// # Errors
///
/// Returns [`ChoroplethError`] if the file cannot be written.
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<(), ChoroplethError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    log::info!(
        "Exported {} county features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}
