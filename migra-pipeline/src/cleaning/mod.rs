//! Cleaning stage: raw files to canonical per-dataset tables
//!
//! Each cleaner reads immutable raw CSVs, maps source columns to canonical
//! names (vintage-dependent for census datasets), builds zero-padded county
//! FIPS keys, coerces numerics, derives secondary metrics, attaches per-year
//! z-scores, and writes one deterministic CSV per dataset under
//! `data/processed/cleaned_data/`. Cleaned tables are regenerated wholesale
//! on every run.

pub mod acs;
pub mod apportion;
pub mod schools;
pub mod zscore;

use crate::frame::{Cell, Frame};
use crate::paths::{year_from_filename, DataPaths};
use migra_common::db::Table;
use migra_common::fips::CountyFips;
use migra_common::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Run the full cleaning stage
pub fn run(paths: &DataPaths) -> Result<()> {
    paths.ensure_directories()?;

    acs::clean_counties(paths)?;
    let population = acs::clean_population(paths)?;
    let economic = acs::clean_economic(paths, &population)?;
    acs::clean_education(paths, &population)?;
    acs::clean_housing(paths, &population, &economic)?;
    apportion::clean_crime(paths, &population)?;
    apportion::clean_job_openings(paths, &population)?;
    schools::clean_public_school(paths, &population)?;

    info!("Cleaning complete");
    Ok(())
}

/// Raw files of a dataset, sorted by year for deterministic processing
pub(crate) fn raw_files(paths: &DataPaths, subdir: &str, prefix: &str) -> Result<Vec<(u16, PathBuf)>> {
    let dir = paths.raw_dataset(subdir);
    if !dir.exists() {
        return Err(Error::NotFound(format!(
            "raw data directory missing: {}",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(prefix) || !name.ends_with(".csv") {
            continue;
        }
        if let Some(year) = year_from_filename(&name) {
            files.push((year, entry.path()));
        }
    }
    files.sort_by_key(|(year, _)| *year);
    Ok(files)
}

/// Add a `COUNTY_FIPS` column built from `STATE` + `COUNTY`, zero-padded
pub(crate) fn add_county_fips(frame: &mut Frame, source: &str) -> Result<()> {
    let state_idx = frame.require_col("STATE")?;
    let county_idx = frame.require_col("COUNTY")?;
    let fips_idx = frame.add_column("COUNTY_FIPS", Cell::Null);

    for row_no in 0..frame.len() {
        let state = frame.get(row_no, state_idx).render();
        let county = frame.get(row_no, county_idx).render();
        let fips = CountyFips::from_parts(&state, &county)
            .map_err(|e| Error::parse(source, row_no + 1, e.to_string()))?;
        frame.set(row_no, fips_idx, Cell::text(fips.as_str()));
        // normalize the components as well so later state joins line up
        frame.set(row_no, state_idx, Cell::text(fips.state().as_str()));
        frame.set(row_no, county_idx, Cell::text(fips.county_code()));
    }
    Ok(())
}

/// Enforce exactly one row per (COUNTY_FIPS, YEAR)
pub(crate) fn assert_unique_keys(frame: &Frame, table: &str) -> Result<()> {
    let fips_idx = frame.require_col("COUNTY_FIPS")?;
    let year_idx = frame.require_col("YEAR")?;
    let mut seen = HashSet::new();
    for row in frame.rows() {
        let key = (row[fips_idx].render(), row[year_idx].render());
        if !seen.insert(key.clone()) {
            return Err(Error::InvalidInput(format!(
                "duplicate (county_fips, year) key ({}, {}) in {}",
                key.0, key.1, table
            )));
        }
    }
    Ok(())
}

/// Sort, validate keys, and write a cleaned table
pub(crate) fn write_cleaned(paths: &DataPaths, table: Table, mut frame: Frame) -> Result<Frame> {
    frame.sort_by(&["COUNTY_FIPS", "YEAR"])?;
    assert_unique_keys(&frame, table.name())?;
    let dest = paths.cleaned_file(table.name());
    frame.write_csv(&dest)?;
    info!("{}: {} rows written to {}", table.name(), frame.len(), dest.display());
    Ok(frame)
}
