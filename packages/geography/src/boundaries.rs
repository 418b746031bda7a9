//! County boundary table for the full-map prediction.
//!
//! Each row of `cmap.csv` carries a county name, a WKT geometry and the
//! county's own GDP per capita and density. The batch predictor runs the
//! model once per row, substituting these two values into the fixed
//! scenario features.

use std::io::Read;
use std::path::Path;

use damage_map_geography_models::CountyAttributes;
use geo::MultiPolygon;
use serde::Deserialize;
use wkt::TryFromWkt;

use crate::GeographyError;

/// A county polygon with the attributes used for map prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct MapCounty {
    /// Stable identifier: the `GEOID` column when present, otherwise the
    /// county name.
    pub id: String,
    /// County display name (the `NAME` column).
    pub name: String,
    /// GDP per capita and density for this county.
    pub attributes: CountyAttributes,
    /// County boundary.
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Deserialize)]
struct RawBoundaryRow {
    #[serde(rename = "GEOID", default)]
    geoid: Option<String>,
    #[serde(rename = "NAME")]
    name: Option<String>,
    geometry: Option<String>,
    #[serde(rename = "GDP_per_capita")]
    gdp_per_capita: Option<f64>,
    #[serde(rename = "Density")]
    density: Option<f64>,
}

/// Loads the county boundary table from a CSV file.
///
/// # Errors
///
/// Returns [`GeographyError`] if the file cannot be read, a required
/// column is missing, or a geometry cell is not valid WKT.
pub fn load_map_counties(path: &Path) -> Result<Vec<MapCounty>, GeographyError> {
    log::info!("Loading county boundaries from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_map_counties(file)
}

/// Parses the county boundary table from any CSV reader.
///
/// Rows without a name, geometry, GDP per capita or density are skipped
/// with a warning since the model cannot score them.
///
/// # Errors
///
/// Returns [`GeographyError`] if the CSV is malformed, a required column is
/// missing, or a geometry cell is not a polygon or multipolygon.
pub fn read_map_counties<R: Read>(reader: R) -> Result<Vec<MapCounty>, GeographyError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in ["NAME", "geometry", "GDP_per_capita", "Density"] {
        if !headers.iter().any(|h| h == column) {
            return Err(GeographyError::MissingColumn {
                table: crate::paths::BOUNDARIES_FILE.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut counties = Vec::new();

    for row in reader.deserialize::<RawBoundaryRow>() {
        let row = row?;

        let Some(name) = row
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
        else {
            log::warn!("Skipping boundary row without a county name");
            continue;
        };

        let Some(wkt_str) = row.geometry.filter(|g| !g.trim().is_empty()) else {
            log::warn!("Skipping boundary row for {name}: no geometry");
            continue;
        };

        let (Some(gdp_per_capita), Some(density)) = (
            row.gdp_per_capita.filter(|v| v.is_finite()),
            row.density.filter(|v| v.is_finite()),
        ) else {
            log::warn!("Skipping boundary row for {name}: missing GDP per capita or density");
            continue;
        };

        let geometry = parse_wkt_multipolygon(&wkt_str).map_err(|message| GeographyError::Geometry {
            county: name.clone(),
            message,
        })?;

        let id = row
            .geoid
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| name.clone());

        counties.push(MapCounty {
            id,
            name,
            attributes: CountyAttributes {
                gdp_per_capita,
                density,
            },
            geometry,
        });
    }

    log::info!("Loaded {} county boundaries", counties.len());

    Ok(counties)
}

/// Parses a WKT string into a [`MultiPolygon`].
/// Handles both `POLYGON` and `MULTIPOLYGON` geometry types.
fn parse_wkt_multipolygon(wkt_str: &str) -> Result<MultiPolygon<f64>, String> {
    let geometry = geo::Geometry::<f64>::try_from_wkt_str(wkt_str.trim())
        .map_err(|e| e.to_string())?;

    match geometry {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        _ => Err("expected POLYGON or MULTIPOLYGON".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP_CSV: &str = "\
GEOID,NAME,geometry,GDP_per_capita,Density
48453,Travis,\"POLYGON ((-98 30, -97 30, -97 31, -98 31, -98 30))\",45000,120
48201,Harris,\"MULTIPOLYGON (((-96 29, -95 29, -95 30, -96 30, -96 29)))\",61000,1100
48001,Anderson,,30000,20
48003,Andrews,\"POLYGON ((-103 32, -102 32, -102 33, -103 33, -103 32))\",,5
";

    #[test]
    fn parses_polygons_and_multipolygons() {
        let counties = read_map_counties(CMAP_CSV.as_bytes()).unwrap();
        assert_eq!(counties.len(), 2);
        assert_eq!(counties[0].id, "48453");
        assert_eq!(counties[0].name, "Travis");
        assert_eq!(counties[0].geometry.0.len(), 1);
        assert_eq!(counties[1].name, "Harris");
        let density = counties[1].attributes.density;
        assert!((density - 1100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn id_falls_back_to_name() {
        let csv = "NAME,geometry,GDP_per_capita,Density\n\
                   Pima,\"POLYGON ((0 0, 1 0, 1 1, 0 0))\",38000,44\n";
        let counties = read_map_counties(csv.as_bytes()).unwrap();
        assert_eq!(counties[0].id, "Pima");
    }

    #[test]
    fn rejects_non_polygon_geometry() {
        let csv = "NAME,geometry,GDP_per_capita,Density\nPima,POINT (1 2),38000,44\n";
        let err = read_map_counties(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GeographyError::Geometry { .. }));
    }

    #[test]
    fn missing_geometry_column_is_reported() {
        let csv = "NAME,GDP_per_capita,Density\nPima,38000,44\n";
        let err = read_map_counties(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GeographyError::MissingColumn { .. }));
    }
}
