//! Census statistical API client
//!
//! The API answers `GET /data/{vintage}/{dataset}` with a JSON array of
//! arrays: the first row is the header, every following row is one
//! geography. Responses are written verbatim to `data/raw/` as CSV; files
//! already on disk are treated as immutable inputs and never re-fetched.

use crate::acquisition::datasets::AcsDataset;
use crate::paths::DataPaths;
use migra_common::fips::EXCLUDED_STATE_FIPS;
use migra_common::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const CENSUS_BASE_URL: &str = "https://api.census.gov/data";
const USER_AGENT: &str = "migra/0.1.0";
const MAX_ATTEMPTS: u32 = 3;

pub struct CensusClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CensusClient {
    pub fn new(api_key: impl Into<String>) -> Result<CensusClient> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(CensusClient {
            http,
            base_url: CENSUS_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Client pointed at a test server
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<CensusClient> {
        let mut client = CensusClient::new(api_key)?;
        client.base_url = base_url.into();
        Ok(client)
    }

    /// Fetch county rows for one dataset vintage. `NAME` is always
    /// requested so cleaned tables can carry county names.
    pub async fn fetch_counties(
        &self,
        dataset: &str,
        year: u16,
        variables: &[&str],
    ) -> Result<Vec<Vec<String>>> {
        let mut get = String::from("NAME");
        for var in variables {
            get.push(',');
            get.push_str(var);
        }
        let url = format!("{}/{}/{}", self.base_url, year, dataset);

        let mut last_error: Option<Error> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .http
                .get(&url)
                .query(&[
                    ("get", get.as_str()),
                    ("for", "county:*"),
                    ("in", "state:*"),
                    ("key", self.api_key.as_str()),
                ])
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::InvalidInput(format!(
                            "census API returned {} for {} vintage {}: {}",
                            status, dataset, year, body
                        )));
                    }
                    let rows: Vec<Vec<String>> = response.json().await?;
                    if rows.is_empty() {
                        return Err(Error::InvalidInput(format!(
                            "census API returned empty result for {} vintage {}",
                            dataset, year
                        )));
                    }
                    return Ok(rows);
                }
                Err(e) => {
                    warn!(
                        "census request failed (attempt {}/{}): {}",
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
        Err(last_error.unwrap_or_else(|| Error::Internal("census request failed".into())))
    }

    /// Download every missing vintage of a dataset into `data/raw/`
    pub async fn download_dataset(&self, spec: &AcsDataset, paths: &DataPaths) -> Result<()> {
        let dir = paths.raw_dataset(spec.raw_subdir);
        std::fs::create_dir_all(&dir)?;

        for year in spec.years.0..=spec.years.1 {
            let Some(vars) = spec.vars_for_year(year) else {
                continue;
            };
            let out = dir.join(format!("{}_{}.csv", spec.file_prefix, year));
            if out.exists() {
                info!("{} {}: already on disk, skipping", spec.key, year);
                continue;
            }
            let rows = self.fetch_counties(spec.dataset, year, vars).await?;
            write_census_rows(&out, rows)?;
            info!("{} {}: downloaded to {}", spec.key, year, out.display());
        }
        Ok(())
    }
}

/// Write API rows as CSV, renaming the trailing geography columns the API
/// appends (`state`, `county`) to canonical upper-case names, and dropping
/// excluded states.
fn write_census_rows(path: &Path, rows: Vec<Vec<String>>) -> Result<()> {
    let mut iter = rows.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| Error::InvalidInput("empty census response".into()))?;

    let state_idx = header.iter().position(|h| h == "state");
    let header: Vec<String> = header
        .into_iter()
        .map(|h| match h.as_str() {
            "state" => "STATE".to_string(),
            "county" => "COUNTY".to_string(),
            other => other.to_string(),
        })
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;
    for row in iter {
        if let Some(idx) = state_idx {
            if let Some(state) = row.get(idx) {
                let padded = format!("{:0>2}", state);
                if EXCLUDED_STATE_FIPS.contains(&padded.as_str()) {
                    continue;
                }
            }
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
