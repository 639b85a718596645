//! Analysis stage: derived tables from cleaned data
//!
//! Runs after cleaning, reading cleaned CSVs from disk and writing derived
//! tables under `data/processed/projected_data/`. Order matters: the
//! population timeseries feeds the 2065 forecast, the forecast feeds the
//! scenario indicator projection, and rankings are derived from the
//! historical indices.

pub mod forecast;
pub mod historical;
pub mod index;
pub mod ranking;
pub mod scenario;

use crate::paths::DataPaths;
use migra_common::Result;
use tracing::info;

pub fn run(paths: &DataPaths) -> Result<()> {
    let timeseries = historical::build_timeseries(paths)?;
    let projections = forecast::project_population(paths, &timeseries)?;
    scenario::project_indicators(paths, &projections)?;
    let indices = index::compute_indices(paths)?;
    ranking::rank_indices(paths, &indices)?;

    info!("Analysis complete");
    Ok(())
}
