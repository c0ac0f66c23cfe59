//! End-to-end tests for the normalizer
//!
//! Exercises each service route on small response bodies shaped like the
//! ones NWIS returns.

pub mod error_handling;

use serde_json::{Value, json};

/// WaterML document with one time series per (site, parameter, blocks) entry
pub(crate) fn waterml(series: &[(&str, &str, Value)]) -> Value {
    let time_series: Vec<Value> = series
        .iter()
        .map(|(site, param, blocks)| {
            json!({
                "sourceInfo": {"siteCode": [{"value": site, "network": "NWIS", "agencyCode": "USGS"}]},
                "variable": {
                    "variableCode": [{"value": param, "network": "NWIS"}],
                    "noDataValue": -999999.0
                },
                "values": blocks
            })
        })
        .collect();
    json!({"name": "ns1:timeSeriesResponseType", "value": {"timeSeries": time_series}})
}

/// One value block with the given method description and (dateTime, value, qualifier) rows
pub(crate) fn block(method: &str, rows: &[(&str, &str, &str)]) -> Value {
    let values: Vec<Value> = rows
        .iter()
        .map(|(dt, v, q)| json!({"dateTime": dt, "value": v, "qualifiers": [q]}))
        .collect();
    json!({"value": values, "method": [{"methodDescription": method, "methodID": 1}]})
}
