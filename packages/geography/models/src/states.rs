//! US state name utilities.
//!
//! Provides the canonical state name table (50 states + DC) with postal
//! abbreviations, plus the title-casing rule used to
//! normalize a selected state before it is matched against disaster
//! schema state columns.

/// A US state (or DC) with its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    /// Two-letter postal abbreviation.
    pub abbr: &'static str,
    /// Full state name as it appears in the reference tables.
    pub name: &'static str,
}

const fn state(abbr: &'static str, name: &'static str) -> UsState {
    UsState { abbr, name }
}

/// The 50 US states + DC, ordered by FIPS code.
pub const US_STATES: &[UsState] = &[
    state("AL", "Alabama"),
    state("AK", "Alaska"),
    state("AZ", "Arizona"),
    state("AR", "Arkansas"),
    state("CA", "California"),
    state("CO", "Colorado"),
    state("CT", "Connecticut"),
    state("DE", "Delaware"),
    state("DC", "District of Columbia"),
    state("FL", "Florida"),
    state("GA", "Georgia"),
    state("HI", "Hawaii"),
    state("ID", "Idaho"),
    state("IL", "Illinois"),
    state("IN", "Indiana"),
    state("IA", "Iowa"),
    state("KS", "Kansas"),
    state("KY", "Kentucky"),
    state("LA", "Louisiana"),
    state("ME", "Maine"),
    state("MD", "Maryland"),
    state("MA", "Massachusetts"),
    state("MI", "Michigan"),
    state("MN", "Minnesota"),
    state("MS", "Mississippi"),
    state("MO", "Missouri"),
    state("MT", "Montana"),
    state("NE", "Nebraska"),
    state("NV", "Nevada"),
    state("NH", "New Hampshire"),
    state("NJ", "New Jersey"),
    state("NM", "New Mexico"),
    state("NY", "New York"),
    state("NC", "North Carolina"),
    state("ND", "North Dakota"),
    state("OH", "Ohio"),
    state("OK", "Oklahoma"),
    state("OR", "Oregon"),
    state("PA", "Pennsylvania"),
    state("RI", "Rhode Island"),
    state("SC", "South Carolina"),
    state("SD", "South Dakota"),
    state("TN", "Tennessee"),
    state("TX", "Texas"),
    state("UT", "Utah"),
    state("VT", "Vermont"),
    state("VA", "Virginia"),
    state("WA", "Washington"),
    state("WV", "West Virginia"),
    state("WI", "Wisconsin"),
    state("WY", "Wyoming"),
];

/// Title-cases a state name: the first letter of every alphabetic run is
/// upper-cased and every other letter lower-cased.
///
/// Non-alphabetic characters split runs, so `"district of columbia"`
/// becomes `"District Of Columbia"` and `"o'brien"` becomes `"O'Brien"`.
#[must_use]
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;

    for c in input.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}

/// Looks up a state by its two-letter abbreviation (case-insensitive).
#[must_use]
pub fn by_abbr(abbr: &str) -> Option<&'static UsState> {
    let abbr = abbr.trim();
    US_STATES.iter().find(|s| s.abbr.eq_ignore_ascii_case(abbr))
}

/// Looks up a state by full name or abbreviation, ignoring case.
#[must_use]
pub fn lookup(input: &str) -> Option<&'static UsState> {
    let input = input.trim();
    by_abbr(input).or_else(|| {
        US_STATES
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(input))
    })
}
