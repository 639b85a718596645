//! Manually supplied input files
//!
//! Some sources have no usable API and arrive as files dropped into
//! `data/raw/` by hand (pre-converted to CSV): state job-openings levels,
//! public-school staffing, and the decennial 1900-1990 county population
//! table. Acquisition verifies they are present so the failure surfaces
//! here rather than mid-cleaning.

use crate::acquisition::datasets::{
    BASE_YEAR, JOB_OPENINGS_PREFIX, JOB_OPENINGS_RAW_SUBDIR, PUBLIC_SCHOOL_PREFIX,
    PUBLIC_SCHOOL_RAW_SUBDIR,
};
use crate::paths::DataPaths;
use migra_common::{Error, Result};
use tracing::info;

/// Check every required manual drop, reporting all missing files at once
pub fn verify_manual_inputs(paths: &DataPaths) -> Result<()> {
    let mut missing = Vec::new();

    let decennial = paths.decennial_population_file();
    if !decennial.exists() {
        missing.push(decennial.display().to_string());
    }

    let school = paths
        .raw_dataset(PUBLIC_SCHOOL_RAW_SUBDIR)
        .join(format!("{}_{}.csv", PUBLIC_SCHOOL_PREFIX, BASE_YEAR));
    if !school.exists() {
        missing.push(school.display().to_string());
    }

    let openings_dir = paths.raw_dataset(JOB_OPENINGS_RAW_SUBDIR);
    let has_openings = std::fs::read_dir(&openings_dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with(JOB_OPENINGS_PREFIX)
            })
        })
        .unwrap_or(false);
    if !has_openings {
        missing.push(format!(
            "{}/{}_<year>.csv (at least one year)",
            openings_dir.display(),
            JOB_OPENINGS_PREFIX
        ));
    }

    if missing.is_empty() {
        info!("all manual input files present");
        Ok(())
    } else {
        Err(Error::NotFound(format!(
            "missing manual input files:\n  {}",
            missing.join("\n  ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let err = verify_manual_inputs(&paths).unwrap_err().to_string();
        assert!(err.contains("decennial_county_population_data_1900_1990.csv"));
        assert!(err.contains("public_school_data"));
        assert!(err.contains("state_job_opening_data"));
    }

    #[test]
    fn passes_when_drops_exist() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        std::fs::create_dir_all(paths.raw_dataset(JOB_OPENINGS_RAW_SUBDIR)).unwrap();
        std::fs::create_dir_all(paths.raw_dataset(PUBLIC_SCHOOL_RAW_SUBDIR)).unwrap();
        std::fs::write(paths.decennial_population_file(), "fips,name\n").unwrap();
        std::fs::write(
            paths
                .raw_dataset(PUBLIC_SCHOOL_RAW_SUBDIR)
                .join(format!("{}_{}.csv", PUBLIC_SCHOOL_PREFIX, BASE_YEAR)),
            "County Name,State,Students,Teachers\n",
        )
        .unwrap();
        std::fs::write(
            paths
                .raw_dataset(JOB_OPENINGS_RAW_SUBDIR)
                .join(format!("{}_2023.csv", JOB_OPENINGS_PREFIX)),
            "STATE,Jan\n",
        )
        .unwrap();
        assert!(verify_manual_inputs(&paths).is_ok());
    }
}
