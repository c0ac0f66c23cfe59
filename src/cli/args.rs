//! Command-line argument definitions for the NWIS processor
//!
//! Defines the `nwis` CLI using the clap derive API.

use crate::error::{NwisError, Result};
use crate::models::{ListArg, Service};
use crate::query::RecordQuery;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Retrieve and normalize USGS NWIS hydrological data
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nwis",
    version,
    about = "Retrieve USGS NWIS water data as normalized tables",
    long_about = "Fetches instantaneous values, daily values, water-quality samples, site \
                  descriptions, discharge measurements and parameter codes from the USGS \
                  National Water Information System and normalizes them into time-indexed \
                  tables that can be written to Parquet or CSV."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Query an NWIS service and normalize the response
    Fetch(FetchArgs),
    /// Normalize a response body saved on disk
    Parse(ParseArgs),
}

/// Arguments for the fetch command
#[derive(Debug, Clone, Parser)]
pub struct FetchArgs {
    /// Service to query: iv, dv, qwdata, site, measurements or pmcodes
    #[arg(short = 's', long = "service", value_name = "SERVICE")]
    pub service: Service,

    /// Comma-separated USGS site numbers
    #[arg(long = "sites", value_name = "LIST", value_delimiter = ',')]
    pub sites: Vec<String>,

    /// State code, used by qwdata when no sites are given
    #[arg(long = "state-cd", value_name = "CODE")]
    pub state_cd: Option<String>,

    /// Start of the record (YYYY-MM-DD)
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<String>,

    /// End of the record (YYYY-MM-DD)
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<String>,

    /// Comma-separated parameter codes (iv and dv only)
    #[arg(long = "params", value_name = "LIST", value_delimiter = ',')]
    pub params: Vec<String>,

    /// Write the table to a .parquet or .csv file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl FetchArgs {
    /// Build the record query described by these arguments
    pub fn to_query(&self) -> RecordQuery {
        let mut query = RecordQuery::new(self.service);
        if !self.sites.is_empty() {
            query = query.with_sites(ListArg::Many(self.sites.clone()));
        }
        if let Some(state_cd) = &self.state_cd {
            query = query.with_state_cd(state_cd.as_str());
        }
        if let Some(start) = &self.start {
            query = query.with_start(start.as_str());
        }
        if let Some(end) = &self.end {
            query = query.with_end(end.as_str());
        }
        if !self.params.is_empty() {
            query = query.with_params(ListArg::Many(self.params.clone()));
        }
        query
    }

    /// Validate the arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(NwisError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }
}

/// Arguments for the parse command
#[derive(Debug, Clone, Parser)]
pub struct ParseArgs {
    /// Service that produced the saved body
    #[arg(short = 's', long = "service", value_name = "SERVICE")]
    pub service: Service,

    /// File holding the response body (JSON for iv/dv, RDB otherwise)
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Write the table to a .parquet or .csv file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ParseArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_file() {
            return Err(NwisError::configuration(format!(
                "Input file does not exist: {}",
                self.input.display()
            )));
        }
        Ok(())
    }
}

impl Args {
    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}
