//! Data Commons statistics client
//!
//! Supplies the state-level crime series the census API does not carry.
//! One series per state is fetched and pivoted into per-year raw CSVs of
//! (STATE, count) rows.

use crate::acquisition::datasets::{CRIME_RAW_SUBDIR, CRIME_STAT_VAR, CRIME_YEARS};
use crate::paths::DataPaths;
use migra_common::fips::contiguous_state_fips;
use migra_common::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const DATACOMMONS_BASE_URL: &str = "https://api.datacommons.org";
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    series: BTreeMap<String, f64>,
}

pub struct DataCommonsClient {
    http: reqwest::Client,
    base_url: String,
}

impl DataCommonsClient {
    pub fn new() -> Result<DataCommonsClient> {
        let http = reqwest::Client::builder()
            .user_agent("migra/0.1.0")
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(DataCommonsClient {
            http,
            base_url: DATACOMMONS_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<DataCommonsClient> {
        let mut client = DataCommonsClient::new()?;
        client.base_url = base_url.into();
        Ok(client)
    }

    /// Yearly values of a statistical variable for one place
    pub async fn stat_series(
        &self,
        place_dcid: &str,
        stat_var: &str,
    ) -> Result<BTreeMap<String, f64>> {
        let url = format!("{}/stat/series", self.base_url);

        let mut last_error: Option<Error> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .http
                .get(&url)
                .query(&[("place", place_dcid), ("stat_var", stat_var)])
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(Error::InvalidInput(format!(
                            "data commons returned {} for {} / {}",
                            status, place_dcid, stat_var
                        )));
                    }
                    let parsed: SeriesResponse = response.json().await?;
                    return Ok(parsed.series);
                }
                Err(e) => {
                    warn!(
                        "data commons request failed (attempt {}/{}): {}",
                        attempt, MAX_ATTEMPTS, e
                    );
                    last_error = Some(e.into());
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(500 * 2u64.pow(attempt - 1)))
                            .await;
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Internal("data commons request failed".into())))
    }

    /// Download state crime counts for every covered state and write one
    /// raw CSV per year. Years already on disk are skipped.
    pub async fn download_state_crime(&self, paths: &DataPaths) -> Result<()> {
        let dir = paths.raw_dataset(CRIME_RAW_SUBDIR);
        std::fs::create_dir_all(&dir)?;

        let missing_years: Vec<u16> = (CRIME_YEARS.0..=CRIME_YEARS.1)
            .filter(|year| !dir.join(format!("state_crime_data_{}.csv", year)).exists())
            .collect();
        if missing_years.is_empty() {
            info!("state crime data already on disk, skipping");
            return Ok(());
        }

        // year -> (state, count)
        let mut by_year: BTreeMap<u16, Vec<(String, f64)>> = BTreeMap::new();
        for state in contiguous_state_fips() {
            let series = self
                .stat_series(&format!("geoId/{}", state), CRIME_STAT_VAR)
                .await?;
            for (year_str, value) in series {
                let Ok(year) = year_str.parse::<u16>() else {
                    continue;
                };
                if missing_years.contains(&year) {
                    by_year
                        .entry(year)
                        .or_default()
                        .push((state.as_str().to_string(), value));
                }
            }
        }

        for (year, mut rows) in by_year {
            rows.sort_by(|a, b| a.0.cmp(&b.0));
            let path = dir.join(format!("state_crime_data_{}.csv", year));
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(["STATE", CRIME_STAT_VAR])?;
            for (state, value) in rows {
                writer.write_record([state, value.to_string()])?;
            }
            writer.flush()?;
            info!("crime {}: written to {}", year, path.display());
        }
        Ok(())
    }
}
