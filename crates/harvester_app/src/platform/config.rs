//! Optional `harvest.ron` overrides for the built-in harvest configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use harvester_engine::{Credentials, FailurePolicy, HarvestConfig};
use log::LevelFilter;
use serde::Deserialize;

pub const CONFIG_FILENAME: &str = "harvest.ron";

/// Every field is optional; anything left out keeps the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub listing_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub link_marker: Option<String>,
    pub probe_concurrency: Option<usize>,
    pub redirect_limit: Option<usize>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub continue_on_failure: bool,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

/// Reads `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {:?}", path));
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse config {:?}", path))
}

impl AppConfig {
    pub fn log_destination(&self) -> LogDestination {
        LogDestination::Both(
            self.log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        )
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn into_harvest_config(self) -> HarvestConfig {
        let mut config = HarvestConfig::default();
        if let Some(listing_url) = self.listing_url {
            config.listing_url = listing_url;
        }
        if self.username.is_some() || self.password.is_some() {
            config.credentials = Credentials {
                username: self.username,
                password: self.password,
            };
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(link_marker) = self.link_marker {
            config.link_marker = link_marker;
        }
        config.probe_concurrency = self.probe_concurrency;
        if let Some(redirect_limit) = self.redirect_limit {
            config.fetch.redirect_limit = redirect_limit;
        }
        config.fetch.connect_timeout = self.connect_timeout_secs.map(Duration::from_secs);
        config.fetch.read_timeout = self.read_timeout_secs.map(Duration::from_secs);
        if self.continue_on_failure {
            config.failure_policy = FailurePolicy::ContinueOnResourceFailure;
        }
        config
    }
}
