//! Long-run county population timeseries
//!
//! Joins the manually supplied decennial census file (1900-1990) with the
//! cleaned modern observations into one wide row per county. Counties
//! missing a 1900-1990 decade keep a null in that column; counties absent
//! from the 2010 observation are dropped because the 2065 forecast
//! apportions regional population by 2010 shares.

use crate::cleaning::assert_unique_keys;
use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::fips::{CountyFips, EXCLUDED_STATE_FIPS};
use migra_common::{Error, Result};
use std::collections::HashMap;
use tracing::info;

/// Modern observation years appended to the decennial decades
pub const MODERN_YEARS: [u16; 3] = [2010, 2020, 2023];

fn is_decade_column(name: &str) -> bool {
    name.len() == 4
        && name.chars().all(|c| c.is_ascii_digit())
        && (1900..=1990).contains(&name.parse::<u16>().unwrap_or(0))
}

pub fn build_timeseries(paths: &DataPaths) -> Result<Frame> {
    let decennial_path = paths.decennial_population_file();
    let source = decennial_path.display().to_string();
    let mut decennial = Frame::from_csv(&decennial_path)?;

    let fips_idx = decennial.require_col("COUNTY_FIPS")?;
    for r in 0..decennial.len() {
        let raw = decennial.get(r, fips_idx).render();
        let fips = CountyFips::parse(&raw)
            .map_err(|e| Error::parse(&source, r + 1, e.to_string()))?;
        decennial.set(r, fips_idx, Cell::text(fips.as_str()));
    }
    decennial.retain_rows(|f, r| {
        let fips = f.get(r, fips_idx).render();
        !fips.ends_with("000") && !EXCLUDED_STATE_FIPS.contains(&&fips[..2])
    });

    let decades: Vec<String> = decennial
        .columns()
        .iter()
        .filter(|c| is_decade_column(c))
        .cloned()
        .collect();
    if decades.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} has no decade columns",
            source
        )));
    }
    let decade_refs: Vec<&str> = decades.iter().map(String::as_str).collect();
    decennial.coerce_numeric(&decade_refs, &source)?;

    let mut columns: Vec<&str> = vec!["COUNTY_FIPS"];
    columns.extend(decade_refs.iter());
    let mut frame = decennial.select(&columns)?;

    // modern observations, keyed for lookup
    let population_path = paths.cleaned_file(Table::CleanedPopulation.name());
    let mut population = Frame::from_csv(&population_path)?;
    let pop_source = population_path.display().to_string();
    population.coerce_numeric(&["YEAR", "POPULATION"], &pop_source)?;
    assert_unique_keys(&population, Table::CleanedPopulation.name())?;

    let mut modern: HashMap<(String, u16), f64> = HashMap::new();
    for r in 0..population.len() {
        if let (Some(fips), Some(year), Some(pop)) = (
            population.text(r, "COUNTY_FIPS"),
            population.num(r, "YEAR"),
            population.num(r, "POPULATION"),
        ) {
            modern.insert((fips.to_string(), year as u16), pop);
        }
    }

    for year in MODERN_YEARS {
        let idx = frame.add_column(year.to_string(), Cell::Null);
        for r in 0..frame.len() {
            let fips = frame.get(r, 0).render();
            if let Some(&pop) = modern.get(&(fips, year)) {
                frame.set(r, idx, Cell::num(pop));
            }
        }
    }
    frame.retain_rows(|f, r| f.num(r, "2010").is_some());

    frame.sort_by(&["COUNTY_FIPS"])?;
    let dest = paths.cleaned_file(Table::TimeseriesPopulation.name());
    frame.write_csv(&dest)?;
    info!(
        "{}: {} rows written to {}",
        Table::TimeseriesPopulation.name(),
        frame.len(),
        dest.display()
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(paths: &DataPaths) {
        std::fs::write(
            paths.decennial_population_file(),
            "COUNTY_FIPS,NAME,1900,1950,1990\n\
             01000,Alabama,1828697,3061743,4040587\n\
             01001,Autauga,17915,18186,34222\n\
             01003,Baldwin,13194,40997,98280\n\
             15001,Hawaii County,.,68350,120317\n",
        )
        .unwrap();
        std::fs::write(
            paths.cleaned_file(Table::CleanedPopulation.name()),
            "COUNTY_FIPS,YEAR,POPULATION,STATE,COUNTY,NAME\n\
             01001,2010,54571,01,001,\"Autauga County, Alabama\"\n\
             01001,2020,58805,01,001,\"Autauga County, Alabama\"\n\
             01001,2023,59285,01,001,\"Autauga County, Alabama\"\n\
             01003,2020,231767,01,003,\"Baldwin County, Alabama\"\n",
        )
        .unwrap();
    }

    #[test]
    fn summaries_and_excluded_states_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();
        fixture(&paths);

        let frame = build_timeseries(&paths).unwrap();
        // 01000 is a state summary, 15xxx is Hawaii, 01003 has no 2010 value
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.text(0, "COUNTY_FIPS"), Some("01001"));
        assert_eq!(frame.num(0, "1900"), Some(17915.0));
        assert_eq!(frame.num(0, "2010"), Some(54571.0));
        assert_eq!(frame.num(0, "2023"), Some(59285.0));
    }

    #[test]
    fn decade_columns_are_recognized() {
        assert!(is_decade_column("1900"));
        assert!(is_decade_column("1990"));
        assert!(!is_decade_column("2000"));
        assert!(!is_decade_column("NAME"));
    }
}
