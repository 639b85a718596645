//! FIPS geography primitives
//!
//! Counties are identified by a 5-digit FIPS code built from a zero-padded
//! 2-digit state code and 3-digit county code. Codes are carried as strings
//! throughout so leading zeros survive every CSV and database round trip.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2-digit state FIPS code, zero-padded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateFips(String);

impl StateFips {
    pub fn parse(raw: &str) -> Result<StateFips> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 2 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!("invalid state FIPS '{}'", raw)));
        }
        Ok(StateFips(format!("{:0>2}", trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 5-digit county FIPS code (state + county), zero-padded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountyFips(String);

impl CountyFips {
    /// Parse a full 5-digit code, accepting shorter digit strings that lost
    /// leading zeros along the way.
    pub fn parse(raw: &str) -> Result<CountyFips> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 5 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!(
                "invalid county FIPS '{}'",
                raw
            )));
        }
        Ok(CountyFips(format!("{:0>5}", trimmed)))
    }

    /// Build from separate state and county components
    pub fn from_parts(state: &str, county: &str) -> Result<CountyFips> {
        let state = StateFips::parse(state)?;
        let county = county.trim();
        if county.is_empty() || county.len() > 3 || !county.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!(
                "invalid county code '{}'",
                county
            )));
        }
        CountyFips::parse(&format!("{}{:0>3}", state, county))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The state component of this county code
    pub fn state(&self) -> StateFips {
        StateFips(self.0[..2].to_string())
    }

    /// The 3-digit county component
    pub fn county_code(&self) -> &str {
        &self.0[2..]
    }

    /// True for state-level placeholder rows (`xx000`) found in the
    /// decennial historical file
    pub fn is_state_summary(&self) -> bool {
        self.county_code() == "000"
    }
}

impl fmt::Display for CountyFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State FIPS codes excluded from acquisition and analysis:
/// DC, Puerto Rico, Hawaii, Alaska, Virgin Islands.
pub const EXCLUDED_STATE_FIPS: [&str; 5] = ["11", "72", "15", "02", "78"];

/// Postal abbreviation to state FIPS for the covered states.
/// Used to join manually supplied school data onto census geographies.
pub fn postal_to_fips(abbrev: &str) -> Option<&'static str> {
    let code = match abbrev.trim().to_ascii_uppercase().as_str() {
        "AL" => "01",
        "AZ" => "04",
        "AR" => "05",
        "CA" => "06",
        "CO" => "08",
        "CT" => "09",
        "DE" => "10",
        "FL" => "12",
        "GA" => "13",
        "ID" => "16",
        "IL" => "17",
        "IN" => "18",
        "IA" => "19",
        "KS" => "20",
        "KY" => "21",
        "LA" => "22",
        "ME" => "23",
        "MD" => "24",
        "MA" => "25",
        "MI" => "26",
        "MN" => "27",
        "MS" => "28",
        "MO" => "29",
        "MT" => "30",
        "NE" => "31",
        "NV" => "32",
        "NH" => "33",
        "NJ" => "34",
        "NM" => "35",
        "NY" => "36",
        "NC" => "37",
        "ND" => "38",
        "OH" => "39",
        "OK" => "40",
        "OR" => "41",
        "PA" => "42",
        "RI" => "44",
        "SC" => "45",
        "SD" => "46",
        "TN" => "47",
        "TX" => "48",
        "UT" => "49",
        "VT" => "50",
        "VA" => "51",
        "WA" => "53",
        "WV" => "54",
        "WI" => "55",
        "WY" => "56",
        _ => return None,
    };
    Some(code)
}

/// Five-region grouping used by the 2065 climate migration scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClimateRegion {
    Northeast,
    South,
    Midwest,
    West,
    California,
}

impl ClimateRegion {
    pub const ALL: [ClimateRegion; 5] = [
        ClimateRegion::Northeast,
        ClimateRegion::South,
        ClimateRegion::Midwest,
        ClimateRegion::West,
        ClimateRegion::California,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClimateRegion::Northeast => "Northeast",
            ClimateRegion::South => "South",
            ClimateRegion::Midwest => "Midwest",
            ClimateRegion::West => "West",
            ClimateRegion::California => "California",
        }
    }

    pub fn parse(s: &str) -> Result<ClimateRegion> {
        match s {
            "Northeast" => Ok(ClimateRegion::Northeast),
            "South" => Ok(ClimateRegion::South),
            "Midwest" => Ok(ClimateRegion::Midwest),
            "West" => Ok(ClimateRegion::West),
            "California" => Ok(ClimateRegion::California),
            other => Err(Error::InvalidInput(format!(
                "unknown climate region '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ClimateRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Climate region for a state FIPS code, None for excluded states
pub fn climate_region(state: &StateFips) -> Option<ClimateRegion> {
    let region = match state.as_str() {
        // Northeast
        "42" | "34" | "36" | "09" | "44" | "25" | "33" | "50" | "23" => ClimateRegion::Northeast,
        // South
        "24" | "10" | "51" | "54" | "21" | "37" | "45" | "47" | "01" | "13" | "12" | "05"
        | "28" | "22" | "40" | "48" => ClimateRegion::South,
        // Midwest
        "30" | "56" | "38" | "46" | "31" | "20" | "27" | "19" | "29" | "55" | "17" | "26"
        | "18" | "39" => ClimateRegion::Midwest,
        // West
        "53" | "41" | "16" | "32" | "49" | "08" | "04" | "35" => ClimateRegion::West,
        "06" => ClimateRegion::California,
        _ => return None,
    };
    Some(region)
}

/// All contiguous-US state FIPS codes covered by the pipeline, ascending
pub fn contiguous_state_fips() -> Vec<StateFips> {
    (1..=56u8)
        .map(|n| StateFips(format!("{:02}", n)))
        .filter(|s| climate_region(s).is_some())
        .collect()
}
