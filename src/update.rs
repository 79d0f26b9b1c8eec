// Update check against the crates.io registry.

use crate::constants::{APP_VERSION, CRATE_NAME};
use crate::error::{CliError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
}

#[derive(Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    newest_version: Option<String>,
}

/// Outcome of comparing the running version with the published one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate(String),
    Available { latest: String },
}

pub struct UpdateChecker {
    client: Client,
    registry_url: String,
}

impl UpdateChecker {
    /// `registry_url` is the crates.io API base, e.g. `https://crates.io/api/v1`.
    pub fn new(registry_url: impl Into<String>) -> Result<Self> {
        // crates.io rejects requests without a User-Agent.
        let client = Client::builder()
            .user_agent(format!("{}/{}", CRATE_NAME, APP_VERSION))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            registry_url: registry_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Latest published version of this crate.
    pub fn latest_version(&self) -> Result<String> {
        let url = format!("{}/crates/{}", self.registry_url, CRATE_NAME);
        debug!("GET {}", url);
        let res = self.client.get(&url).send()?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(CliError::api(status, res.text().unwrap_or_default()));
        }
        let body: CrateResponse = res.json()?;
        body.krate
            .max_stable_version
            .or(body.krate.newest_version)
            .ok_or_else(|| CliError::api(reqwest::StatusCode::OK, "registry returned no version"))
    }

    pub fn check(&self, current: &str) -> Result<UpdateStatus> {
        let latest = self.latest_version()?;
        debug!("Current version {}, latest {}", current, latest);
        Ok(compare(current, &latest))
    }
}

fn compare(current: &str, latest: &str) -> UpdateStatus {
    let normalize = |v: &str| v.trim().trim_start_matches('v').to_string();
    if normalize(current) == normalize(latest) {
        UpdateStatus::UpToDate(normalize(current))
    } else {
        UpdateStatus::Available {
            latest: normalize(latest),
        }
    }
}
