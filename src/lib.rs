//! NWIS Processor Library
//!
//! Retrieves hydrological data from the USGS National Water Information
//! System and normalizes the heterogeneous responses into uniform,
//! time-indexed polars DataFrames.
//!
//! This library provides tools for:
//! - Parsing tab-delimited RDB bodies with comment preambles
//! - Flattening WaterML JSON time series into one column pair per parameter and method
//! - Outer-joining partial tables on (`site_no`, `datetime`)
//! - As-of merging indexed tables by nearest earlier timestamp
//! - Deriving UTC timestamps for water-quality samples
//! - Building service requests and fetching them over HTTP
//! - Writing normalized tables to Parquet or CSV

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod models;
pub mod processor;
pub mod query;
pub mod timezones;
pub mod writer;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

pub use client::NwisClient;
pub use config::{NwisConfig, RdbConfig};
pub use error::{NwisError, Result};
pub use models::{ListArg, NormalizedTable, RawResponse, Service, TableIndex};
pub use processor::ResponseNormalizer;
pub use processor::merge::merge_asof;
pub use query::{RecordQuery, RequestSpec};
pub use writer::TableWriter;
