//! Cleaner for the manually supplied public school dataset
//!
//! The source lists individual schools with postal state abbreviations and
//! county display names, so rows are aggregated per county and joined onto
//! census geographies by (state FIPS, county name). Counties without any
//! school rows are dropped rather than zero-filled; base-year scenario math
//! treats absent school coverage as out of scope.

use crate::acquisition::datasets::{BASE_YEAR, PUBLIC_SCHOOL_PREFIX, PUBLIC_SCHOOL_RAW_SUBDIR};
use crate::cleaning::acs::population_for_year;
use crate::cleaning::zscore::{add_z_scores, round2};
use crate::cleaning::{raw_files, write_cleaned};
use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::fips::postal_to_fips;
use migra_common::{Error, Result};
use std::collections::BTreeMap;
use tracing::warn;

pub fn clean_public_school(paths: &DataPaths, population: &Frame) -> Result<Frame> {
    let files = raw_files(paths, PUBLIC_SCHOOL_RAW_SUBDIR, PUBLIC_SCHOOL_PREFIX)?;
    let (_, path) = files
        .iter()
        .find(|(year, _)| *year == BASE_YEAR)
        .ok_or_else(|| {
            Error::NotFound(format!(
                "public school data for {} missing under data/raw/{}",
                BASE_YEAR, PUBLIC_SCHOOL_RAW_SUBDIR
            ))
        })?;
    let source = path.display().to_string();

    let mut raw = Frame::from_csv(path)?;
    raw.rename_column("County Name", "COUNTY_NAME")?;
    raw.rename_column("State", "STATE_POSTAL")?;
    raw.rename_column("Students", "PUBLIC_SCHOOL_STUDENTS")?;
    raw.rename_column("Teachers", "PUBLIC_SCHOOL_TEACHERS")?;
    raw.coerce_numeric(&["PUBLIC_SCHOOL_STUDENTS", "PUBLIC_SCHOOL_TEACHERS"], &source)?;

    // per-school rows aggregated to (state fips, county name)
    let mut totals: BTreeMap<(String, String), (f64, f64)> = BTreeMap::new();
    let mut skipped = 0usize;
    for r in 0..raw.len() {
        let postal = raw.text(r, "STATE_POSTAL").unwrap_or_default();
        let Some(state) = postal_to_fips(postal) else {
            skipped += 1;
            continue;
        };
        let county = raw
            .text(r, "COUNTY_NAME")
            .unwrap_or_default()
            .trim()
            .to_string();
        if county.is_empty() {
            skipped += 1;
            continue;
        }
        let entry = totals.entry((state.to_string(), county)).or_insert((0.0, 0.0));
        entry.0 += raw.num(r, "PUBLIC_SCHOOL_STUDENTS").unwrap_or(0.0);
        entry.1 += raw.num(r, "PUBLIC_SCHOOL_TEACHERS").unwrap_or(0.0);
    }
    if skipped > 0 {
        warn!("{}: skipped {} school rows outside covered states", source, skipped);
    }

    let mut aggregated = Frame::new(vec![
        "STATE",
        "COUNTY_NAME",
        "PUBLIC_SCHOOL_STUDENTS",
        "PUBLIC_SCHOOL_TEACHERS",
        "STUDENT_TEACHER_RATIO",
    ]);
    for ((state, county), (students, teachers)) in totals {
        let ratio = if teachers > 0.0 {
            round2(students / teachers)
        } else {
            0.0
        };
        aggregated.push_row(vec![
            Cell::text(state),
            Cell::text(county),
            Cell::num(students),
            Cell::num(teachers),
            Cell::num(ratio),
        ])?;
    }

    // census NAME is "Autauga County, Alabama"; the county display name is
    // the part before the comma
    let mut counties = population_for_year(population, BASE_YEAR)?;
    let name_idx = counties.add_column("COUNTY_NAME", Cell::Null);
    for r in 0..counties.len() {
        let display = counties
            .text(r, "NAME")
            .and_then(|n| n.split(',').next())
            .unwrap_or_default()
            .trim()
            .to_string();
        counties.set(r, name_idx, Cell::text(display));
    }

    let mut frame = counties.inner_join(&aggregated, &["STATE", "COUNTY_NAME"])?;
    frame.drop_columns_where(|c| c == "COUNTY_NAME");
    frame.add_column("YEAR", Cell::num(BASE_YEAR as f64));
    let mut frame = frame.select(&[
        "COUNTY_FIPS",
        "YEAR",
        "PUBLIC_SCHOOL_STUDENTS",
        "PUBLIC_SCHOOL_TEACHERS",
        "STUDENT_TEACHER_RATIO",
        "STATE",
        "COUNTY",
        "NAME",
        "POPULATION",
    ])?;

    add_z_scores(&mut frame, "YEAR")?;
    write_cleaned(paths, Table::CleanedPublicSchool, frame)
}
