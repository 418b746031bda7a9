//! County-year economic panel.
//!
//! Holds one [`CountyRecord`] per (state, county, year) and answers the
//! lookups needed to assemble a single-point prediction: the state list,
//! the counties of a state, and GDP per capita / density for a county in
//! a given year (with the explicit fallback for future scenario years).

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use damage_map_geography_models::{
    CountyAttributes, CountyRecord, FutureYearSource, LAST_HISTORICAL_YEAR, states,
};
use serde::Deserialize;

use crate::GeographyError;

/// Panel row as it appears in the CSV. Cells may be empty.
#[derive(Debug, Deserialize)]
struct RawPanelRow {
    #[serde(rename = "State")]
    state: Option<String>,
    #[serde(rename = "County")]
    county: Option<String>,
    #[serde(rename = "Year")]
    year: Option<i32>,
    #[serde(rename = "GDP_per_capita")]
    gdp_per_capita: Option<f64>,
    #[serde(rename = "Density")]
    density: Option<f64>,
}

impl RawPanelRow {
    fn into_record(self) -> Option<CountyRecord> {
        let state = self.state.map(|s| s.trim().to_string())?;
        let county = self.county.map(|c| c.trim().to_string())?;
        if state.is_empty() || county.is_empty() {
            return None;
        }
        let gdp_per_capita = self.gdp_per_capita.filter(|v| v.is_finite())?;
        let density = self.density.filter(|v| v.is_finite())?;

        Some(CountyRecord {
            state,
            county,
            year: self.year?,
            gdp_per_capita,
            density,
        })
    }
}

type PanelKey = (String, String, i32);

/// In-memory county-year panel.
#[derive(Debug, Default)]
pub struct CountyPanel {
    records: Vec<CountyRecord>,
    index: BTreeMap<PanelKey, usize>,
}

impl CountyPanel {
    /// Loads the panel from a CSV file with columns
    /// `State,County,Year,GDP_per_capita,Density`.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, GeographyError> {
        log::info!("Loading county panel from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses the panel from any CSV reader.
    ///
    /// Rows missing a state, county, year or either measurement are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the CSV is malformed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeographyError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in ["State", "County", "Year", "GDP_per_capita", "Density"] {
            if !headers.iter().any(|h| h == column) {
                return Err(GeographyError::MissingColumn {
                    table: crate::paths::PANEL_FILE.to_string(),
                    column: column.to_string(),
                });
            }
        }

        let mut records = Vec::new();
        let mut skipped = 0u64;

        for row in reader.deserialize::<RawPanelRow>() {
            match row?.into_record() {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {skipped} incomplete panel rows");
        }

        Ok(Self::from_records(records))
    }

    /// Builds a panel from already-parsed records.
    ///
    /// Duplicate (state, county, year) rows keep the first occurrence.
    #[must_use]
    pub fn from_records(records: Vec<CountyRecord>) -> Self {
        let mut index = BTreeMap::new();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            let key = (record.state.clone(), record.county.clone(), record.year);
            if index.contains_key(&key) {
                log::warn!(
                    "Duplicate panel row for {}, {} in {}; keeping the first",
                    record.county,
                    record.state,
                    record.year
                );
                continue;
            }
            index.insert(key, kept.len());
            kept.push(record);
        }

        log::info!("County panel holds {} records", kept.len());

        Self {
            records: kept,
            index,
        }
    }

    /// Number of records in the panel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the panel has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted, de-duplicated state names present in the panel.
    #[must_use]
    pub fn states(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.state.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted, de-duplicated county names for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::MissingCounties`] if the state has no
    /// counties in the panel.
    pub fn counties(&self, state: &str) -> Result<Vec<&str>, GeographyError> {
        let counties: Vec<&str> = self
            .records
            .iter()
            .filter(|r| r.state == state)
            .map(|r| r.county.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if counties.is_empty() {
            return Err(GeographyError::MissingCounties {
                state: state.to_string(),
            });
        }

        Ok(counties)
    }

    /// Resolves user input to a panel state name.
    ///
    /// Matches the stored name case-insensitively, or a postal
    /// abbreviation whose full name is in the panel.
    #[must_use]
    pub fn find_state(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        let known = self.states();

        known
            .iter()
            .find(|s| s.eq_ignore_ascii_case(input))
            .or_else(|| {
                let full = states::lookup(input)?.name;
                known.iter().find(|s| s.eq_ignore_ascii_case(full))
            })
            .copied()
    }

    /// Resolves user input to a county name of `state`, ignoring case.
    #[must_use]
    pub fn find_county(&self, state: &str, input: &str) -> Option<&str> {
        let input = input.trim();
        self.records
            .iter()
            .find(|r| r.state == state && r.county.eq_ignore_ascii_case(input))
            .map(|r| r.county.as_str())
    }

    /// Exact lookup of a (state, county, year) record.
    #[must_use]
    pub fn lookup(&self, state: &str, county: &str, year: i32) -> Option<&CountyRecord> {
        self.index
            .get(&(state.to_string(), county.to_string(), year))
            .map(|&i| &self.records[i])
    }

    /// Latest year present in the panel.
    #[must_use]
    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }

    /// Resolves GDP per capita and density for a scenario.
    ///
    /// Years up to [`LAST_HISTORICAL_YEAR`] use the county's own record for
    /// that year. Later years use `future`: manual values are returned as
    /// given, [`FutureYearSource::LatestRecorded`] reuses the county's
    /// [`LAST_HISTORICAL_YEAR`] record verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::InvalidGeography`] if the needed record
    /// does not exist.
    pub fn attributes_for(
        &self,
        state: &str,
        county: &str,
        year: i32,
        future: FutureYearSource,
    ) -> Result<CountyAttributes, GeographyError> {
        let lookup_year = if year > LAST_HISTORICAL_YEAR {
            match future {
                FutureYearSource::Manual(attributes) => {
                    log::debug!("Using manual GDP/density for {county}, {state} in {year}");
                    return Ok(attributes);
                }
                FutureYearSource::LatestRecorded => LAST_HISTORICAL_YEAR,
            }
        } else {
            year
        };

        self.lookup(state, county, lookup_year)
            .map(CountyRecord::attributes)
            .ok_or_else(|| GeographyError::InvalidGeography {
                state: state.to_string(),
                county: county.to_string(),
                year: lookup_year,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL_CSV: &str = "\
State,County,Year,GDP_per_capita,Density
Texas,Travis,2021,44000,118
Texas,Travis,2022,45000,120
Texas,Harris,2022,61000,1100
Texas,Harris,2022,99999,9999
Arizona,Pima,2022,38000,44
Arizona,,2022,1,1
Arizona,Yuma,2022,,20
";

    fn panel() -> CountyPanel {
        CountyPanel::from_reader(PANEL_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn skips_incomplete_rows_and_duplicates() {
        let panel = panel();
        assert_eq!(panel.len(), 4);
        let harris = panel.lookup("Texas", "Harris", 2022).unwrap();
        assert!((harris.gdp_per_capita - 61_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn states_and_counties_are_sorted() {
        let panel = panel();
        assert_eq!(panel.states(), vec!["Arizona", "Texas"]);
        assert_eq!(panel.counties("Texas").unwrap(), vec!["Harris", "Travis"]);
    }

    #[test]
    fn missing_counties_is_an_error() {
        let err = panel().counties("Ohio").unwrap_err();
        assert!(matches!(err, GeographyError::MissingCounties { .. }));
        assert_eq!(
            err.to_string(),
            "No counties found for the selected state: Ohio"
        );
    }

    #[test]
    fn historical_lookup() {
        let attrs = panel()
            .attributes_for("Texas", "Travis", 2021, FutureYearSource::LatestRecorded)
            .unwrap();
        assert!((attrs.gdp_per_capita - 44_000.0).abs() < f64::EPSILON);
        assert!((attrs.density - 118.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_year_is_invalid_geography() {
        let err = panel()
            .attributes_for("Texas", "Harris", 2021, FutureYearSource::LatestRecorded)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No GDP or Density data found for Harris, Texas in the year 2021."
        );
    }

    #[test]
    fn future_year_reuses_last_recorded_values() {
        let attrs = panel()
            .attributes_for("Texas", "Travis", 2025, FutureYearSource::LatestRecorded)
            .unwrap();
        assert_eq!(
            attrs,
            CountyAttributes {
                gdp_per_capita: 45_000.0,
                density: 120.0,
            }
        );
    }

    #[test]
    fn future_year_without_last_record_reports_fallback_year() {
        let err = panel()
            .attributes_for("Texas", "Nowhere", 2027, FutureYearSource::LatestRecorded)
            .unwrap_err();
        let GeographyError::InvalidGeography { year, .. } = err else {
            panic!("expected an invalid geography error, got {err}");
        };
        assert_eq!(year, 2022);
    }

    #[test]
    fn future_year_manual_values_skip_lookup() {
        let manual = CountyAttributes {
            gdp_per_capita: 1.0,
            density: 2.0,
        };
        let attrs = panel()
            .attributes_for("Texas", "Nowhere", 2030, FutureYearSource::Manual(manual))
            .unwrap();
        assert_eq!(attrs, manual);
    }

    #[test]
    fn resolves_state_and_county_input() {
        let panel = panel();
        assert_eq!(panel.find_state("texas"), Some("Texas"));
        assert_eq!(panel.find_state("AZ"), Some("Arizona"));
        assert_eq!(panel.find_state("OH"), None);
        assert_eq!(panel.find_county("Texas", "travis"), Some("Travis"));
        assert_eq!(panel.latest_year(), Some(2022));
    }

    #[test]
    fn missing_column_is_reported() {
        let err = CountyPanel::from_reader("State,County,Year\nTexas,Travis,2022\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, GeographyError::MissingColumn { .. }));
    }
}
