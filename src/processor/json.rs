//! WaterML JSON time-series parsing
//!
//! The iv and dv services answer with `value.timeSeries[]`, one entry per
//! (site, parameter), each holding one value block per measurement method.
//! Every non-empty block becomes a small table that is merged into the
//! accumulated result in source order.

use crate::constants::JSON_NAIVE_DATETIME_FORMAT;
use crate::constants::columns::{DATETIME, SITE_NO};
use crate::error::{NwisError, Result};
use crate::models::{TimeSeriesObservation, TimeSeriesRecord};
use crate::processor::merge::merge_into;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct WaterMlResponse {
    value: WaterMlValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WaterMlValue {
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSeries {
    source_info: SourceInfo,
    variable: Variable,
    values: Vec<ValueBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceInfo {
    site_code: Vec<CodeValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Variable {
    variable_code: Vec<CodeValue>,
    #[serde(default)]
    no_data_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CodeValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ValueBlock {
    value: Vec<RawObservation>,
    #[serde(default)]
    method: Vec<Method>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Method {
    #[serde(default)]
    method_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObservation {
    date_time: String,
    value: serde_json::Value,
    #[serde(default)]
    qualifiers: Vec<String>,
}

/// Parse a decoded WaterML JSON document into one merged DataFrame.
///
/// Fails with `EmptyResult` when no value block carries observations.
pub fn parse_waterml(json: &serde_json::Value) -> Result<DataFrame> {
    let mut merged: Option<DataFrame> = None;

    for record in extract_records(json)? {
        let frame = record_to_frame(&record)?;
        merged = Some(merge_into(merged, frame)?);
    }

    merged.ok_or(NwisError::EmptyResult)
}

/// Flatten the document into one record per non-empty value block, in source order
pub fn extract_records(json: &serde_json::Value) -> Result<Vec<TimeSeriesRecord>> {
    let response = WaterMlResponse::deserialize(json)
        .map_err(|e| NwisError::malformed(format!("Unexpected WaterML JSON shape: {}", e)))?;

    let mut records = Vec::new();
    for series in response.value.time_series {
        let site_no = first_code(&series.source_info.site_code, "sourceInfo.siteCode")?;
        let parameter_cd = first_code(&series.variable.variable_code, "variable.variableCode")?;

        for block in series.values {
            let description = block
                .method
                .first()
                .and_then(|method| method.method_description.as_deref());
            let column_name = column_name(&parameter_cd, description);

            if block.value.is_empty() {
                debug!("Skipping empty value block {} at site {}", column_name, site_no);
                continue;
            }

            let observations = block
                .value
                .iter()
                .map(|raw| parse_observation(raw, series.variable.no_data_value))
                .collect::<Result<Vec<_>>>()?;

            records.push(TimeSeriesRecord {
                site_no: site_no.clone(),
                parameter_cd: parameter_cd.clone(),
                column_name,
                observations,
            });
        }
    }

    debug!("Extracted {} non-empty value blocks", records.len());
    Ok(records)
}

/// Value column name for a parameter and optional method description.
///
/// `("00060", Some("[Instantaneous]"))` becomes `00060_instantaneous`.
pub fn column_name(parameter_cd: &str, method_description: Option<&str>) -> String {
    let method = method_description
        .map(|desc| {
            desc.trim()
                .trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'))
                .trim()
                .to_lowercase()
        })
        .filter(|method| !method.is_empty());

    match method {
        Some(method) => format!("{}_{}", parameter_cd, method),
        None => parameter_cd.to_string(),
    }
}

/// Build the per-block table: site, timestamp, value and qualifier columns
pub fn record_to_frame(record: &TimeSeriesRecord) -> Result<DataFrame> {
    let rows = record.observations.len();

    let timestamps: Vec<i64> = record
        .observations
        .iter()
        .map(|obs| obs.datetime.and_utc().timestamp_millis())
        .collect();
    let datetime = Series::new(DATETIME.into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    let values: Vec<Option<f64>> = record.observations.iter().map(|obs| obs.value).collect();
    let qualifiers: Vec<&str> = record
        .observations
        .iter()
        .map(|obs| obs.qualifiers.as_str())
        .collect();

    let df = DataFrame::new(vec![
        Series::new(SITE_NO.into(), vec![record.site_no.as_str(); rows]).into(),
        datetime.into(),
        Series::new(record.column_name.as_str().into(), values).into(),
        Series::new(record.qualifier_column().into(), qualifiers).into(),
    ])?;

    Ok(df)
}

fn first_code(codes: &[CodeValue], path: &str) -> Result<String> {
    codes
        .first()
        .map(|code| code.value.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| NwisError::malformed(format!("Missing {}[0].value", path)))
}

fn parse_observation(raw: &RawObservation, no_data_value: Option<f64>) -> Result<TimeSeriesObservation> {
    let datetime = parse_timestamp(&raw.date_time)?;

    let value = match &raw.value {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| {
            NwisError::malformed(format!("Non-numeric value '{}' at {}", s, raw.date_time))
        })?),
        other => {
            return Err(NwisError::malformed(format!(
                "Unexpected value {} at {}",
                other, raw.date_time
            )));
        }
    };
    let value = value.filter(|v| Some(*v) != no_data_value);

    Ok(TimeSeriesObservation {
        datetime,
        value,
        qualifiers: flatten_qualifiers(&raw.qualifiers),
    })
}

/// Timestamps with an offset become naive UTC; naive ones are kept as given
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, JSON_NAIVE_DATETIME_FORMAT) {
        return Ok(naive);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| NwisError::malformed(format!("Unparseable dateTime '{}'", raw)))
}

fn flatten_qualifiers(qualifiers: &[String]) -> String {
    qualifiers
        .iter()
        .map(|q| q.trim_matches(|c| matches!(c, '[' | ']' | '\'' | '"' | ' ')))
        .filter(|q| !q.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
