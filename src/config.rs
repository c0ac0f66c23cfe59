//! Configuration management and validation.
//!
//! Provides the service endpoints, RDB format markers and fixed query
//! payloads used by the query builder, the HTTP client and the parsers.

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, NO_DATA_SENTINEL, PMCODES_URL, QWDATA_DEFAULT_PAYLOAD,
    QWDATA_URL, RDB_COMMENT_PREFIX, RDB_MISSING_VALUE, WATERDATA_URL, WATERSERVICES_URL,
};
use crate::error::{NwisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// RDB format markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdbConfig {
    /// Leading character of comment lines
    pub comment_prefix: char,

    /// Field token read as a missing value
    pub missing_value: String,

    /// Body prefix signalling that nothing matched
    pub no_data_sentinel: String,
}

impl Default for RdbConfig {
    fn default() -> Self {
        Self {
            comment_prefix: RDB_COMMENT_PREFIX,
            missing_value: RDB_MISSING_VALUE.to_string(),
            no_data_sentinel: NO_DATA_SENTINEL.to_string(),
        }
    }
}

/// Main configuration for NWIS retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NwisConfig {
    /// Base URL for iv, dv and site requests
    pub waterservices_url: String,

    /// Base URL for measurements requests
    pub waterdata_url: String,

    /// Sample (qwdata) endpoint
    pub qwdata_url: String,

    /// Parameter code catalogue endpoint
    pub pmcodes_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// RDB parsing markers
    pub rdb: RdbConfig,

    /// Query pairs always sent to qwdata
    pub sample_defaults: Vec<(String, String)>,
}

impl Default for NwisConfig {
    fn default() -> Self {
        Self {
            waterservices_url: WATERSERVICES_URL.to_string(),
            waterdata_url: WATERDATA_URL.to_string(),
            qwdata_url: QWDATA_URL.to_string(),
            pmcodes_url: PMCODES_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rdb: RdbConfig::default(),
            sample_defaults: QWDATA_DEFAULT_PAYLOAD
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl NwisConfig {
    /// Load configuration from a JSON file, falling back to defaults for absent keys
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            NwisError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: NwisConfig = serde_json::from_str(&contents).map_err(|e| {
            NwisError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject configurations that cannot produce a request
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("waterservices_url", &self.waterservices_url),
            ("waterdata_url", &self.waterdata_url),
            ("qwdata_url", &self.qwdata_url),
            ("pmcodes_url", &self.pmcodes_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(NwisError::configuration(format!("{} must not be empty", name)));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(NwisError::configuration(
                "request_timeout_secs must be greater than zero",
            ));
        }

        if self.rdb.no_data_sentinel.is_empty() {
            return Err(NwisError::configuration("rdb.no_data_sentinel must not be empty"));
        }

        Ok(())
    }

    /// Point every endpoint at a different host (mirrors, test servers)
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.waterservices_url = format!("{}/nwis/", base);
        self.waterdata_url = format!("{}/nwis/", base);
        self.qwdata_url = format!("{}/nwis/qwdata", base);
        self.pmcodes_url = format!("{}/nwis/pmcodes", base);
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Replace the RDB markers
    pub fn with_rdb(mut self, rdb: RdbConfig) -> Self {
        self.rdb = rdb;
        self
    }

    /// Join a service path onto the waterservices base URL
    pub fn waterservices_endpoint(&self, path: &str) -> String {
        join_url(&self.waterservices_url, path)
    }

    /// Join a page path onto the waterdata base URL
    pub fn waterdata_endpoint(&self, path: &str) -> String {
        join_url(&self.waterdata_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
