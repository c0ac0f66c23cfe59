//! Response normalization engine.
//!
//! Routes a raw service response through the matching parser, applies the
//! per-service pre-shaping and finishes with the index policy: one site is
//! indexed by `datetime`, several sites by (`site_no`, `datetime`), and
//! tables without a `datetime` column are left unindexed.

pub mod json;
pub mod merge;
pub mod rdb;
pub mod samples;

#[cfg(test)]
pub mod tests;

use crate::config::{NwisConfig, RdbConfig};
use crate::constants::columns::{DATETIME, SITE_NO};
use crate::error::{NwisError, Result};
use crate::models::{NormalizedTable, RawResponse, Service, TableIndex};

use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Turns raw NWIS responses into indexed tables
#[derive(Debug, Clone, Default)]
pub struct ResponseNormalizer {
    rdb: RdbConfig,
}

impl ResponseNormalizer {
    /// Create a normalizer with explicit RDB markers
    pub fn new(rdb: RdbConfig) -> Self {
        Self { rdb }
    }

    /// Create a normalizer from the retrieval configuration
    pub fn from_config(config: &NwisConfig) -> Self {
        Self::new(config.rdb.clone())
    }

    /// Normalize one response of the given service
    pub fn normalize(&self, service: Service, response: RawResponse) -> Result<NormalizedTable> {
        let frame = match (service, response) {
            (Service::InstantaneousValues | Service::DailyValues, RawResponse::Json(value)) => {
                json::parse_waterml(&value)?
            }
            (Service::WaterQualitySamples, RawResponse::Text(body)) => {
                let raw = rdb::parse_rdb(&body, &self.rdb)?;
                samples::derive_sample_datetime(raw)?
            }
            (
                Service::SiteDescription | Service::DischargeMeasurements | Service::ParameterCodes,
                RawResponse::Text(body),
            ) => rdb::parse_rdb(&body, &self.rdb)?,
            (service, response) => {
                return Err(NwisError::malformed(format!(
                    "Service '{}' does not answer with {} payloads",
                    service,
                    response.kind()
                )));
            }
        };

        debug!(
            "Parsed {} response: {} rows x {} columns",
            service,
            frame.height(),
            frame.width()
        );

        finalize(frame)
    }
}

/// Apply the index policy and a stable sort by the index columns
pub fn finalize(df: DataFrame) -> Result<NormalizedTable> {
    let index = choose_index(&df)?;
    if index == TableIndex::None {
        debug!("No {} column; returning unindexed table", DATETIME);
        return Ok(NormalizedTable { frame: df, index });
    }

    let duplicates = count_duplicate_keys(&df, index)?;
    if duplicates > 0 {
        warn!(
            "{} rows repeat an earlier {:?} index key",
            duplicates,
            index.columns()
        );
    }

    let sort_exprs: Vec<Expr> = index.columns().iter().map(|name| col(*name)).collect();
    let sorted = df
        .lazy()
        .sort_by_exprs(
            sort_exprs,
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )
        .collect()?;

    let frame = index_columns_first(sorted, index)?;
    Ok(NormalizedTable { frame, index })
}

/// One distinct site (or no site column) gives a `datetime` index
fn choose_index(df: &DataFrame) -> Result<TableIndex> {
    if df.column(DATETIME).is_err() {
        return Ok(TableIndex::None);
    }

    let sites = match df.column(SITE_NO) {
        Ok(column) => column.n_unique()?,
        Err(_) => 0,
    };

    Ok(if sites > 1 {
        TableIndex::SiteDatetime
    } else {
        TableIndex::Datetime
    })
}

fn count_duplicate_keys(df: &DataFrame, index: TableIndex) -> Result<usize> {
    let timestamps = df.column(DATETIME)?.cast(&DataType::Int64)?;
    let timestamps = timestamps.i64()?;

    let mut duplicates = 0;
    match index {
        TableIndex::None => {}
        TableIndex::Datetime => {
            let mut seen = HashSet::new();
            for ts in timestamps.into_iter().flatten() {
                if !seen.insert(ts) {
                    duplicates += 1;
                }
            }
        }
        TableIndex::SiteDatetime => {
            let sites = df.column(SITE_NO)?.cast(&DataType::String)?;
            let sites = sites.str()?;
            let mut seen = HashSet::new();
            for (site, ts) in sites.into_iter().zip(timestamps) {
                if let Some(ts) = ts {
                    if !seen.insert((site, ts)) {
                        duplicates += 1;
                    }
                }
            }
        }
    }

    Ok(duplicates)
}

fn index_columns_first(df: DataFrame, index: TableIndex) -> Result<DataFrame> {
    let index_columns = index.columns();
    let order: Vec<String> = index_columns
        .iter()
        .map(|name| name.to_string())
        .chain(
            df.get_column_names_str()
                .into_iter()
                .filter(|name| !index_columns.contains(name))
                .map(str::to_string),
        )
        .collect();

    Ok(df.select(order)?)
}
