//! Cleaners for census ACS datasets
//!
//! Raw files carry the census variable codes; each cleaner maps the codes
//! valid for a file's vintage onto canonical names, keys rows by county
//! FIPS and year, and computes that dataset's derived metrics.

use crate::acquisition::datasets;
use crate::cleaning::zscore::{add_z_scores, round2};
use crate::cleaning::{add_county_fips, raw_files, write_cleaned};
use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::{Error, Result};
use tracing::info;

/// variable code → canonical column name
type ColumnMap = &'static [(&'static str, &'static str)];

const ECONOMIC_COLUMNS: ColumnMap = &[
    ("B19301_001E", "MEDIAN_INCOME"),
    ("B23025_004E", "TOTAL_EMPLOYED_POPULATION"),
    ("B23025_005E", "UNEMPLOYED_PERSONS"),
    ("B23025_003E", "TOTAL_LABOR_FORCE"),
];

const EDUCATION_COLUMNS: ColumnMap = &[
    ("B23006_001E", "TOTAL_POPULATION_25_64"),
    ("B23006_002E", "LESS_THAN_HIGH_SCHOOL_TOTAL"),
    ("B23006_009E", "HIGH_SCHOOL_GRADUATE_TOTAL"),
    ("B23006_016E", "SOME_COLLEGE_TOTAL"),
    ("B23006_023E", "BACHELORS_OR_HIGHER_TOTAL"),
    ("B14001_001E", "TOTAL_ENROLLED_AND_NOT_ENROLLED"),
    ("B14001_002E", "TOTAL_ENROLLED"),
    ("B14001_003E", "ENROLLED_NURSERY_PRESCHOOL"),
    ("B14001_004E", "ENROLLED_KINDERGARTEN"),
    ("B14001_005E", "ENROLLED_GRADE1_4"),
    ("B14001_006E", "ENROLLED_GRADE5_8"),
    ("B14001_007E", "ENROLLED_GRADE9_12"),
    ("B14001_008E", "ENROLLED_COLLEGE_UNDERGRAD"),
    ("B14001_009E", "ENROLLED_GRADUATE_PROFESSIONAL"),
    ("B23006_007E", "LESS_THAN_HIGH_SCHOOL_UNEMPLOYED"),
    ("B23006_014E", "HIGH_SCHOOL_GRADUATE_UNEMPLOYED"),
    ("B23006_021E", "SOME_COLLEGE_UNEMPLOYED"),
    ("B23006_028E", "BACHELORS_OR_HIGHER_UNEMPLOYED"),
    ("B01001_004E", "MALE_5_9"),
    ("B01001_005E", "MALE_10_14"),
    ("B01001_006E", "MALE_15_17"),
    ("B01001_028E", "FEMALE_5_9"),
    ("B01001_029E", "FEMALE_10_14"),
    ("B01001_030E", "FEMALE_15_17"),
];

/// The profile table renumbered its columns in 2015
const HOUSING_COLUMNS_2010_2014: ColumnMap = &[
    ("DP04_0001E", "TOTAL_HOUSING_UNITS"),
    ("DP04_0044E", "OCCUPIED_HOUSING_UNITS"),
    ("DP04_0088E", "MEDIAN_HOUSING_VALUE"),
    ("DP04_0132E", "MEDIAN_GROSS_RENT"),
];
const HOUSING_COLUMNS_2015_2023: ColumnMap = &[
    ("DP04_0001E", "TOTAL_HOUSING_UNITS"),
    ("DP04_0002E", "OCCUPIED_HOUSING_UNITS"),
    ("DP04_0089E", "MEDIAN_HOUSING_VALUE"),
    ("DP04_0134E", "MEDIAN_GROSS_RENT"),
];

fn housing_columns(year: u16) -> ColumnMap {
    if year <= 2014 {
        HOUSING_COLUMNS_2010_2014
    } else {
        HOUSING_COLUMNS_2015_2023
    }
}

/// Canonical county reference table, written as `county.csv`
pub fn clean_counties(paths: &DataPaths) -> Result<Frame> {
    let files = raw_files(paths, datasets::COUNTIES.raw_subdir, datasets::COUNTIES.file_prefix)?;
    let (_, path) = files
        .last()
        .ok_or_else(|| Error::NotFound("no county names file in data/raw/counties_data".into()))?;

    let mut frame = Frame::from_csv(path)?;
    add_county_fips(&mut frame, &path.display().to_string())?;
    let mut frame = frame.select(&["COUNTY_FIPS", "STATE", "COUNTY", "NAME"])?;
    frame.sort_by(&["COUNTY_FIPS"])?;

    let dest = paths.cleaned_file(Table::County.name());
    frame.write_csv(&dest)?;
    info!("county: {} rows written to {}", frame.len(), dest.display());
    Ok(frame)
}

/// Cleaned population observations; also the join source every other
/// cleaner uses for POPULATION/STATE/COUNTY/NAME columns.
pub fn clean_population(paths: &DataPaths) -> Result<Frame> {
    let spec = &datasets::POPULATION;
    let mut combined: Option<Frame> = None;

    for (year, path) in raw_files(paths, spec.raw_subdir, spec.file_prefix)? {
        let source = path.display().to_string();
        let mut frame = Frame::from_csv(&path)?;
        add_county_fips(&mut frame, &source)?;
        frame.rename_column("B01003_001E", "POPULATION")?;
        frame.add_column("YEAR", Cell::num(year as f64));
        let mut frame =
            frame.select(&["COUNTY_FIPS", "YEAR", "POPULATION", "STATE", "COUNTY", "NAME"])?;
        frame.coerce_numeric(&["POPULATION"], &source)?;

        match &mut combined {
            Some(all) => all.append(frame)?,
            None => combined = Some(frame),
        }
    }

    let combined = combined
        .ok_or_else(|| Error::NotFound("no raw population files to clean".into()))?;
    write_cleaned(paths, Table::CleanedPopulation, combined)
}

/// Population rows for a single year, keyed by COUNTY_FIPS
pub(crate) fn population_for_year(population: &Frame, year: u16) -> Result<Frame> {
    let mut frame = population.select(&["COUNTY_FIPS", "STATE", "COUNTY", "NAME", "POPULATION", "YEAR"])?;
    frame.retain_rows(|f, r| f.num(r, "YEAR") == Some(year as f64));
    frame.drop_columns_where(|c| c == "YEAR");
    Ok(frame)
}

/// Shared flow for the census observation datasets: map columns per
/// vintage, key rows, coerce numerics, then attach population columns.
fn clean_acs_frames(
    paths: &DataPaths,
    spec: &datasets::AcsDataset,
    columns_for: impl Fn(u16) -> ColumnMap,
    population: &Frame,
) -> Result<Frame> {
    let mut combined: Option<Frame> = None;

    for (year, path) in raw_files(paths, spec.raw_subdir, spec.file_prefix)? {
        let source = path.display().to_string();
        let columns = columns_for(year);

        let mut frame = Frame::from_csv(&path)?;
        add_county_fips(&mut frame, &source)?;
        for (raw, canonical) in columns {
            frame.rename_column(raw, canonical)?;
        }
        frame.add_column("YEAR", Cell::num(year as f64));

        let mut selected: Vec<&str> = vec!["COUNTY_FIPS", "YEAR"];
        selected.extend(columns.iter().map(|(_, canonical)| *canonical));
        let mut frame = frame.select(&selected)?;

        let metric_names: Vec<&str> = columns.iter().map(|(_, c)| *c).collect();
        frame.coerce_numeric(&metric_names, &source)?;

        match &mut combined {
            Some(all) => all.append(frame)?,
            None => combined = Some(frame),
        }
    }

    let combined = combined.ok_or_else(|| {
        Error::NotFound(format!("no raw {} files to clean", spec.key))
    })?;
    combined.left_join(population, &["COUNTY_FIPS", "YEAR"])
}

pub fn clean_economic(paths: &DataPaths, population: &Frame) -> Result<Frame> {
    let mut frame = clean_acs_frames(paths, &datasets::ECONOMIC, |_| ECONOMIC_COLUMNS, population)?;

    let rate_idx = frame.add_column("UNEMPLOYMENT_RATE", Cell::Null);
    for r in 0..frame.len() {
        let rate = match (frame.num(r, "UNEMPLOYED_PERSONS"), frame.num(r, "TOTAL_LABOR_FORCE")) {
            (Some(unemployed), Some(labor_force)) if labor_force > 0.0 => {
                Cell::num(round2(unemployed / labor_force * 100.0))
            }
            _ => Cell::Null,
        };
        frame.set(r, rate_idx, rate);
    }

    add_z_scores(&mut frame, "YEAR")?;
    write_cleaned(paths, Table::CleanedEconomic, frame)
}

pub fn clean_education(paths: &DataPaths, population: &Frame) -> Result<Frame> {
    let mut frame = clean_acs_frames(paths, &datasets::EDUCATION, |_| EDUCATION_COLUMNS, population)?;

    // school-age populations from the sex-by-age counts
    for (target, male, female) in [
        ("ELEMENTARY_SCHOOL_POPULATION", "MALE_5_9", "FEMALE_5_9"),
        ("MIDDLE_SCHOOL_POPULATION", "MALE_10_14", "FEMALE_10_14"),
        ("HIGH_SCHOOL_POPULATION", "MALE_15_17", "FEMALE_15_17"),
    ] {
        let idx = frame.add_column(target, Cell::Null);
        for r in 0..frame.len() {
            let cell = match (frame.num(r, male), frame.num(r, female)) {
                (Some(m), Some(f)) => Cell::num(m + f),
                _ => Cell::Null,
            };
            frame.set(r, idx, cell);
        }
    }

    add_z_scores(&mut frame, "YEAR")?;
    write_cleaned(paths, Table::CleanedEducation, frame)
}

pub fn clean_housing(paths: &DataPaths, population: &Frame, economic: &Frame) -> Result<Frame> {
    let frame = clean_acs_frames(paths, &datasets::HOUSING, housing_columns, population)?;

    // affordability needs median income from the economic table
    let income = economic.select(&["COUNTY_FIPS", "YEAR", "MEDIAN_INCOME"])?;
    let mut frame = frame.left_join(&income, &["COUNTY_FIPS", "YEAR"])?;

    let afford_idx = frame.add_column("HOUSE_AFFORDABILITY", Cell::Null);
    for r in 0..frame.len() {
        let cell = match (frame.num(r, "MEDIAN_GROSS_RENT"), frame.num(r, "MEDIAN_INCOME")) {
            (Some(rent), Some(income)) if income > 0.0 => {
                Cell::num(round4_ratio(rent * 12.0 / income))
            }
            _ => Cell::Null,
        };
        frame.set(r, afford_idx, cell);
    }
    frame.drop_columns_where(|c| c == "MEDIAN_INCOME");

    add_z_scores(&mut frame, "YEAR")?;
    write_cleaned(paths, Table::CleanedHousing, frame)
}

fn round4_ratio(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::datasets::{ECONOMIC, POPULATION};

    fn write_raw(paths: &DataPaths, subdir: &str, name: &str, content: &str) {
        let dir = paths.raw_dataset(subdir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn fixture(paths: &DataPaths) {
        write_raw(
            paths,
            POPULATION.raw_subdir,
            "census_population_data_2023.csv",
            "NAME,B01003_001E,STATE,COUNTY\n\
             \"Autauga County, Alabama\",59285,01,001\n\
             \"Baldwin County, Alabama\",239945,01,003\n",
        );
        write_raw(
            paths,
            ECONOMIC.raw_subdir,
            "census_economic_data_2023.csv",
            "NAME,B19301_001E,B23025_004E,B23025_005E,B23025_003E,STATE,COUNTY\n\
             \"Autauga County, Alabama\",32600,26700,900,27600,01,001\n\
             \"Baldwin County, Alabama\",36000,100000,4000,104000,01,003\n",
        );
    }

    #[test]
    fn population_rows_are_keyed_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();
        fixture(&paths);

        let population = clean_population(&paths).unwrap();
        assert_eq!(population.len(), 2);
        assert_eq!(population.text(0, "COUNTY_FIPS"), Some("01001"));
        assert_eq!(population.num(0, "POPULATION"), Some(59285.0));
    }

    #[test]
    fn unemployment_rate_is_derived() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();
        fixture(&paths);

        let population = clean_population(&paths).unwrap();
        let economic = clean_economic(&paths, &population).unwrap();

        // 900 / 27600 * 100 = 3.260..., rounded to 3.26
        assert_eq!(economic.num(0, "UNEMPLOYMENT_RATE"), Some(3.26));
        // population columns joined in
        assert_eq!(economic.num(0, "POPULATION"), Some(59285.0));
        assert!(economic.has_col("UNEMPLOYMENT_RATE_Z_SCORE"));
    }

    #[test]
    fn education_maps_enrollment_and_unemployment_columns() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();
        fixture(&paths);

        let codes = datasets::EDUCATION.vars_for_year(2023).unwrap();
        let values: Vec<String> = (1..=codes.len()).map(|v| v.to_string()).collect();
        write_raw(
            &paths,
            datasets::EDUCATION.raw_subdir,
            "census_education_data_2023.csv",
            &format!(
                "NAME,{},STATE,COUNTY\n\"Autauga County, Alabama\",{},01,001\n",
                codes.join(","),
                values.join(",")
            ),
        );

        let population = clean_population(&paths).unwrap();
        let education = clean_education(&paths, &population).unwrap();

        assert_eq!(education.len(), 1);
        assert_eq!(education.num(0, "ENROLLED_KINDERGARTEN"), Some(9.0));
        assert_eq!(education.num(0, "ENROLLED_GRADUATE_PROFESSIONAL"), Some(14.0));
        assert_eq!(education.num(0, "HIGH_SCHOOL_GRADUATE_UNEMPLOYED"), Some(16.0));
        assert_eq!(education.num(0, "BACHELORS_OR_HIGHER_UNEMPLOYED"), Some(18.0));
        // school-age sums still derive from the sex-by-age counts
        assert_eq!(education.num(0, "ELEMENTARY_SCHOOL_POPULATION"), Some(41.0));
    }

    #[test]
    fn malformed_numeric_cell_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();
        write_raw(
            &paths,
            POPULATION.raw_subdir,
            "census_population_data_2023.csv",
            "NAME,B01003_001E,STATE,COUNTY\nSomewhere,not-a-number,01,001\n",
        );
        let err = clean_population(&paths).unwrap_err().to_string();
        assert!(err.contains("census_population_data_2023.csv"), "{}", err);
    }
}
