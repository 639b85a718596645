//! Population-share apportionment of state-level datasets
//!
//! Crime counts and monthly job openings are only published per state.
//! Each county receives the state value scaled by its share of the state
//! population for that year, so county totals sum back to the state figure
//! up to rounding.

use crate::acquisition::datasets::{
    CRIME_RAW_SUBDIR, CRIME_STAT_VAR, JOB_OPENINGS_PREFIX, JOB_OPENINGS_RAW_SUBDIR,
};
use crate::cleaning::acs::population_for_year;
use crate::cleaning::zscore::add_z_scores;
use crate::cleaning::{raw_files, write_cleaned};
use crate::frame::{Cell, Frame};
use migra_common::db::Table;
use migra_common::fips::StateFips;
use migra_common::{Error, Result};

pub const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// County population shares of their state total for one year.
/// Columns: COUNTY_FIPS, STATE, COUNTY, NAME, POPULATION, POP_RATIO.
fn county_shares(population: &Frame, year: u16) -> Result<Frame> {
    let mut shares = population_for_year(population, year)?;
    let state_totals = shares.group_sum("STATE", "POPULATION")?;

    let ratio_idx = shares.add_column("POP_RATIO", Cell::Null);
    for r in 0..shares.len() {
        let state = shares.text(r, "STATE").unwrap_or_default().to_string();
        let cell = match (shares.num(r, "POPULATION"), state_totals.get(&state)) {
            (Some(pop), Some(&total)) if total > 0.0 => Cell::num(pop / total),
            _ => Cell::num(0.0),
        };
        shares.set(r, ratio_idx, cell);
    }
    Ok(shares)
}

/// Read a state-keyed raw file and normalize its STATE column
fn read_state_file(path: &std::path::Path, metrics: &[&str]) -> Result<Frame> {
    let source = path.display().to_string();
    let mut frame = Frame::from_csv(path)?;
    let state_idx = frame.require_col("STATE")?;
    for r in 0..frame.len() {
        let raw = frame.get(r, state_idx).render();
        let state = StateFips::parse(&raw)
            .map_err(|e| Error::parse(&source, r + 1, e.to_string()))?;
        frame.set(r, state_idx, Cell::text(state.as_str()));
    }
    frame.coerce_numeric(metrics, &source)?;
    Ok(frame)
}

pub fn clean_crime(paths: &crate::paths::DataPaths, population: &Frame) -> Result<Frame> {
    let mut combined: Option<Frame> = None;

    for (year, path) in raw_files(paths, CRIME_RAW_SUBDIR, CRIME_RAW_SUBDIR)? {
        let state_frame = read_state_file(&path, &[CRIME_STAT_VAR])?;
        let mut frame = county_shares(population, year)?.left_join(&state_frame, &["STATE"])?;

        let crime_idx = frame.add_column("CRIMINAL_ACTIVITIES", Cell::Null);
        for r in 0..frame.len() {
            // states absent from the source file stay missing, not zero
            let cell = match (frame.num(r, "POP_RATIO"), frame.num(r, CRIME_STAT_VAR)) {
                (Some(ratio), Some(count)) => Cell::num((ratio * count).round()),
                _ => Cell::Null,
            };
            frame.set(r, crime_idx, cell);
        }

        frame.add_column("YEAR", Cell::num(year as f64));
        let frame = frame.select(&[
            "COUNTY_FIPS",
            "YEAR",
            "CRIMINAL_ACTIVITIES",
            "STATE",
            "COUNTY",
            "NAME",
            "POPULATION",
        ])?;

        match &mut combined {
            Some(all) => all.append(frame)?,
            None => combined = Some(frame),
        }
    }

    let mut combined =
        combined.ok_or_else(|| Error::NotFound("no raw state crime files to clean".into()))?;
    add_z_scores(&mut combined, "YEAR")?;
    write_cleaned(paths, Table::CleanedCrime, combined)
}

pub fn clean_job_openings(paths: &crate::paths::DataPaths, population: &Frame) -> Result<Frame> {
    let mut combined: Option<Frame> = None;

    for (year, path) in raw_files(paths, JOB_OPENINGS_RAW_SUBDIR, JOB_OPENINGS_PREFIX)? {
        let state_frame = read_state_file(&path, &MONTHS)?;
        let mut frame = county_shares(population, year)?.left_join(&state_frame, &["STATE"])?;

        // source figures are thousands of openings
        for month in MONTHS {
            let idx = frame.add_column(format!("JOB_OPENING_{}", month), Cell::Null);
            for r in 0..frame.len() {
                let cell = match (frame.num(r, "POP_RATIO"), frame.num(r, month)) {
                    (Some(ratio), Some(openings)) => {
                        Cell::num((ratio * openings * 1000.0).round())
                    }
                    _ => Cell::Null,
                };
                frame.set(r, idx, cell);
            }
        }

        frame.add_column("YEAR", Cell::num(year as f64));
        let mut selected: Vec<String> = vec!["COUNTY_FIPS".into(), "YEAR".into()];
        selected.extend(MONTHS.iter().map(|m| format!("JOB_OPENING_{}", m)));
        selected.extend(["STATE", "COUNTY", "NAME", "POPULATION"].map(String::from));
        let names: Vec<&str> = selected.iter().map(String::as_str).collect();
        let frame = frame.select(&names)?;

        match &mut combined {
            Some(all) => all.append(frame)?,
            None => combined = Some(frame),
        }
    }

    let mut combined =
        combined.ok_or_else(|| Error::NotFound("no raw job openings files to clean".into()))?;
    add_z_scores(&mut combined, "YEAR")?;
    write_cleaned(paths, Table::CleanedJobOpenings, combined)
}
