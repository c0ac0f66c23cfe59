//! Error handling for NWIS retrieval and normalization.
//!
//! Separates "the service has no data" from "the response is not what its
//! format promises", and wraps the failures of the crates underneath.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NwisError {
    #[error("No data returned by the service")]
    EmptyResult,

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NwisError {
    /// Create a malformed response error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the service reported that nothing matched the query
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }
}

pub type Result<T> = std::result::Result<T, NwisError>;
