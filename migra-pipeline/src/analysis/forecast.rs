//! 2065 county population forecast
//!
//! Regional 2065 shares come from the Qin Fan et al. interregional
//! migration model: S3 is the no-climate-change baseline, S5 the
//! climate-affected projection. The S5 regional shift is applied at half,
//! full, and double intensity (S5a/S5b/S5c), then each region's projected
//! population is apportioned to its counties by their 2010 share of the
//! regional population.

use crate::cleaning::zscore::round2;
use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::fips::{climate_region, ClimateRegion, CountyFips};
use migra_common::{Error, Result};
use std::collections::HashMap;
use tracing::info;

/// Census Bureau 2065 national projection
pub const NATIONAL_POPULATION_2065: f64 = 366_207_000.0;

/// (region, 2010 census share %, S3 share %, S5 share %)
const REGION_SHARES: [(ClimateRegion, f64, f64, f64); 5] = [
    (ClimateRegion::Northeast, 18.70, 15.05, 16.42),
    (ClimateRegion::Midwest, 20.77, 21.33, 20.35),
    (ClimateRegion::South, 39.13, 41.53, 38.18),
    (ClimateRegion::West, 8.84, 8.78, 10.07),
    (ClimateRegion::California, 12.56, 13.31, 14.98),
];

/// Scenario labels in output order. `Original` carries the unchanged 2023
/// observation so dashboards can chart the projections against it.
pub const SCENARIOS: [&str; 5] = ["Original", "S3", "S5a", "S5b", "S5c"];

/// Climate-shift intensities for the S5 variants
const S5_INTENSITIES: [(&str, f64); 3] = [("S5a", 0.5), ("S5b", 1.0), ("S5c", 2.0)];

/// 2065 population for one region under each scenario
fn regional_projections() -> HashMap<ClimateRegion, HashMap<&'static str, f64>> {
    let mut out = HashMap::new();
    for (region, _, s3, s5) in REGION_SHARES {
        let mut per_scenario = HashMap::new();
        per_scenario.insert("S3", (s3 / 100.0 * NATIONAL_POPULATION_2065).trunc());
        // relative regional shift caused by climate migration
        let effect = s5 / s3 - 1.0;
        for (label, intensity) in S5_INTENSITIES {
            let share = s3 * (1.0 + effect * intensity) / 100.0;
            per_scenario.insert(label, (share * NATIONAL_POPULATION_2065).trunc());
        }
        out.insert(region, per_scenario);
    }
    out
}

/// Project 2065 county populations from the timeseries and write
/// `county_population_projections.csv`. Output columns are COUNTY_FIPS,
/// then POPULATION_{scenario} and PCT_CHANGE_{scenario} per scenario.
pub fn project_population(paths: &DataPaths, timeseries: &Frame) -> Result<Frame> {
    let regional = regional_projections();

    // regional 2010 totals over the covered counties
    let mut region_2010: HashMap<ClimateRegion, f64> = HashMap::new();
    for r in 0..timeseries.len() {
        let (Some(fips), Some(pop)) = (timeseries.text(r, "COUNTY_FIPS"), timeseries.num(r, "2010"))
        else {
            continue;
        };
        let fips = CountyFips::parse(fips)?;
        if let Some(region) = climate_region(&fips.state()) {
            *region_2010.entry(region).or_insert(0.0) += pop;
        }
    }

    let mut columns: Vec<String> = vec!["COUNTY_FIPS".into()];
    for scenario in SCENARIOS {
        columns.push(format!("POPULATION_{}", scenario.to_ascii_uppercase()));
        columns.push(format!("PCT_CHANGE_{}", scenario.to_ascii_uppercase()));
    }
    let mut frame = Frame::new(columns);

    for r in 0..timeseries.len() {
        let (Some(fips_str), Some(pop_2010), Some(pop_2023)) = (
            timeseries.text(r, "COUNTY_FIPS"),
            timeseries.num(r, "2010"),
            timeseries.num(r, "2023"),
        ) else {
            continue;
        };
        if pop_2023 <= 0.0 {
            continue;
        }
        let fips = CountyFips::parse(fips_str)?;
        let Some(region) = climate_region(&fips.state()) else {
            continue;
        };
        let region_total = region_2010
            .get(&region)
            .copied()
            .filter(|t| *t > 0.0)
            .ok_or_else(|| {
                Error::Internal(format!("no 2010 population total for region {}", region))
            })?;
        let county_share = pop_2010 / region_total;

        let mut row = vec![Cell::text(fips.as_str())];
        for scenario in SCENARIOS {
            let projected = if scenario == "Original" {
                pop_2023
            } else {
                let regional_pop = regional[&region][scenario];
                (regional_pop * county_share).trunc()
            };
            let pct_change = round2((projected - pop_2023) / pop_2023 * 100.0);
            row.push(Cell::num(projected));
            row.push(Cell::num(pct_change));
        }
        frame.push_row(row)?;
    }

    frame.sort_by(&["COUNTY_FIPS"])?;
    let dest = paths.projected_file(Table::PopulationProjections.name());
    frame.write_csv(&dest)?;
    info!(
        "{}: {} rows written to {}",
        Table::PopulationProjections.name(),
        frame.len(),
        dest.display()
    );
    Ok(frame)
}
