//! Raw data acquisition: census API downloads, Data Commons series, and
//! verification of manually dropped files

pub mod census;
pub mod datacommons;
pub mod datasets;
pub mod manual;

use crate::paths::DataPaths;
use census::CensusClient;
use datacommons::DataCommonsClient;
use migra_common::{Error, Result, Settings};
use tracing::info;

/// Run the full acquisition stage
pub async fn run(settings: &Settings, paths: &DataPaths) -> Result<()> {
    let api_key = settings
        .census_api_key
        .as_deref()
        .ok_or_else(|| Error::Config("census_api_key required for acquisition".into()))?;

    paths.ensure_directories()?;

    let census = CensusClient::new(api_key)?;
    for spec in &datasets::ACS_DATASETS {
        info!("Acquiring {} data", spec.key);
        census.download_dataset(spec, paths).await?;
    }

    info!("Acquiring state crime data");
    let datacommons = DataCommonsClient::new()?;
    datacommons.download_state_crime(paths).await?;

    manual::verify_manual_inputs(paths)?;

    info!("Acquisition complete");
    Ok(())
}
