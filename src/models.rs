//! Core data structures and types for NWIS processing.
//!
//! Defines the service kinds, raw response payloads, the intermediate
//! time-series record and the finalized, indexed table.

use crate::constants::columns::{DATETIME, SITE_NO};
use crate::error::{NwisError, Result};
use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Services supported by NWIS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    /// Instantaneous values (`iv`), WaterML JSON
    InstantaneousValues,
    /// Daily values (`dv`), WaterML JSON
    DailyValues,
    /// Discrete water-quality samples (`qwdata`), RDB
    WaterQualitySamples,
    /// Site description (`site`), RDB
    SiteDescription,
    /// Discharge field measurements (`measurements`), RDB
    DischargeMeasurements,
    /// Parameter code catalogue (`pmcodes`), RDB
    ParameterCodes,
}

impl Service {
    /// Short service name as used in NWIS URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::InstantaneousValues => "iv",
            Service::DailyValues => "dv",
            Service::WaterQualitySamples => "qwdata",
            Service::SiteDescription => "site",
            Service::DischargeMeasurements => "measurements",
            Service::ParameterCodes => "pmcodes",
        }
    }

    /// Whether the service answers in WaterML JSON rather than RDB
    pub fn is_json(&self) -> bool {
        matches!(self, Service::InstantaneousValues | Service::DailyValues)
    }
}

impl FromStr for Service {
    type Err = NwisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "iv" => Ok(Service::InstantaneousValues),
            "dv" => Ok(Service::DailyValues),
            "qwdata" => Ok(Service::WaterQualitySamples),
            "site" => Ok(Service::SiteDescription),
            "measurements" => Ok(Service::DischargeMeasurements),
            "pmcodes" => Ok(Service::ParameterCodes),
            other => Err(NwisError::configuration(format!(
                "Unrecognized service '{}' (expected iv, dv, qwdata, site, measurements or pmcodes)",
                other
            ))),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a service response, before normalization
#[derive(Debug, Clone)]
pub enum RawResponse {
    /// Tab-delimited RDB text
    Text(String),
    /// Decoded WaterML JSON
    Json(serde_json::Value),
}

impl RawResponse {
    /// Payload kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            RawResponse::Text(_) => "RDB text",
            RawResponse::Json(_) => "JSON",
        }
    }
}

/// A list-valued query argument: either separate items or an already joined string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListArg {
    Many(Vec<String>),
    Joined(String),
}

impl ListArg {
    /// Comma-joined form used as a query value
    pub fn to_query_value(&self) -> String {
        match self {
            ListArg::Many(items) => items.join(","),
            ListArg::Joined(joined) => joined.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ListArg::Many(items) => items.iter().all(|item| item.trim().is_empty()),
            ListArg::Joined(joined) => joined.trim().is_empty(),
        }
    }
}

impl From<&str> for ListArg {
    fn from(value: &str) -> Self {
        ListArg::Joined(value.to_string())
    }
}

impl From<String> for ListArg {
    fn from(value: String) -> Self {
        ListArg::Joined(value)
    }
}

impl From<Vec<String>> for ListArg {
    fn from(value: Vec<String>) -> Self {
        ListArg::Many(value)
    }
}

impl From<&[&str]> for ListArg {
    fn from(value: &[&str]) -> Self {
        ListArg::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

/// One observation of a WaterML value block
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesObservation {
    pub datetime: NaiveDateTime,
    pub value: Option<f64>,
    pub qualifiers: String,
}

/// Observations of one (site, parameter, method) triple
#[derive(Debug, Clone)]
pub struct TimeSeriesRecord {
    pub site_no: String,
    pub parameter_cd: String,
    /// Output column name, unique per parameter and method
    pub column_name: String,
    pub observations: Vec<TimeSeriesObservation>,
}

impl TimeSeriesRecord {
    /// Name of the companion qualifier column
    pub fn qualifier_column(&self) -> String {
        format!(
            "{}{}",
            self.column_name,
            crate::constants::columns::QUALIFIER_SUFFIX
        )
    }
}

/// Row identity of a normalized table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableIndex {
    /// Non time-series table, rows in service order
    None,
    /// Single site, ordered by `datetime`
    Datetime,
    /// Several sites, ordered by `site_no` then `datetime`
    SiteDatetime,
}

impl TableIndex {
    /// Columns forming the index, in sort order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableIndex::None => &[],
            TableIndex::Datetime => &[DATETIME],
            TableIndex::SiteDatetime => &[SITE_NO, DATETIME],
        }
    }
}

/// A finalized table with its index
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub frame: DataFrame,
    pub index: TableIndex,
}

impl NormalizedTable {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Names of the non-index columns
    pub fn value_columns(&self) -> Vec<String> {
        let index_columns = self.index.columns();
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|name| !index_columns.contains(&name.as_str()))
            .map(|name| name.to_string())
            .collect()
    }
}
