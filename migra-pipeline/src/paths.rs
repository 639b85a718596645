//! Raw and processed data directory layout
//!
//! Everything lives under the configured data root:
//!
//! ```text
//! data/
//!   raw/
//!     population_data/          census_population_data_{year}.csv
//!     economic_data/            census_economic_data_{year}.csv
//!     education_data/           census_education_data_{year}.csv
//!     housing_data/             census_housing_data_{year}.csv
//!     counties_data/            county_names_{year}.csv
//!     state_crime_data/         state_crime_data_{year}.csv
//!     monthly_job_openings_data/ state_job_opening_data_{year}.csv   (manual drop)
//!     public_school_data/       public_school_data_{year}.csv        (manual drop)
//!     decennial_county_population_data_1900_1990.csv                 (manual drop)
//!   processed/
//!     cleaned_data/             cleaned_*.csv, county.csv, timeseries_population.csv
//!     projected_data/           county_population_projections.csv, combined_2065_data.csv, ...
//! ```

use migra_common::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> DataPaths {
        DataPaths { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn raw_dataset(&self, subdir: &str) -> PathBuf {
        self.raw().join(subdir)
    }

    pub fn decennial_population_file(&self) -> PathBuf {
        self.raw()
            .join("decennial_county_population_data_1900_1990.csv")
    }

    pub fn processed(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn cleaned(&self) -> PathBuf {
        self.processed().join("cleaned_data")
    }

    pub fn cleaned_file(&self, table: &str) -> PathBuf {
        self.cleaned().join(format!("{}.csv", table))
    }

    pub fn projected(&self) -> PathBuf {
        self.processed().join("projected_data")
    }

    pub fn projected_file(&self, table: &str) -> PathBuf {
        self.projected().join(format!("{}.csv", table))
    }

    /// Create the directory tree for a pipeline run
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.raw(),
            self.cleaned(),
            self.projected(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Extract a 4-digit year from a file name, e.g.
/// `census_population_data_2019.csv` → 2019.
pub fn year_from_filename(name: &str) -> Option<u16> {
    let bytes = name.as_bytes();
    for start in 0..bytes.len().saturating_sub(3) {
        let window = &name[start..start + 4];
        if window.chars().all(|c| c.is_ascii_digit()) {
            // avoid matching inside longer digit runs
            let before_ok = start == 0 || !bytes[start - 1].is_ascii_digit();
            let after_ok = start + 4 >= bytes.len() || !bytes[start + 4].is_ascii_digit();
            if before_ok && after_ok {
                return window.parse().ok();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_is_parsed_from_filenames() {
        assert_eq!(year_from_filename("census_population_data_2019.csv"), Some(2019));
        assert_eq!(year_from_filename("state_crime_data_2010.csv"), Some(2010));
        assert_eq!(year_from_filename("no_year_here.csv"), None);
    }

    #[test]
    fn long_digit_runs_are_not_years() {
        assert_eq!(year_from_filename("dump_123456.csv"), None);
    }

    #[test]
    fn layout_is_rooted() {
        let paths = DataPaths::new("/tmp/data");
        assert_eq!(
            paths.cleaned_file("cleaned_economic_data"),
            PathBuf::from("/tmp/data/processed/cleaned_data/cleaned_economic_data.csv")
        );
    }
}
