//! Failure modes of normalization

use super::waterml;
use crate::error::NwisError;
use crate::models::{RawResponse, Service};
use crate::processor::ResponseNormalizer;
use serde_json::json;

#[test]
fn test_no_data_sentinel_for_every_rdb_service() {
    let normalizer = ResponseNormalizer::default();
    for service in [
        Service::WaterQualitySamples,
        Service::SiteDescription,
        Service::DischargeMeasurements,
        Service::ParameterCodes,
    ] {
        let body = "No sites/data found using the selection criteria specified \n".to_string();
        let err = normalizer.normalize(service, RawResponse::Text(body)).unwrap_err();
        assert!(err.is_empty_result(), "{} should report no data", service);
    }
}

#[test]
fn test_json_without_observations_is_empty() {
    let json = waterml(&[("03339000", "00060", json!([{"value": [], "method": []}]))]);
    let err = ResponseNormalizer::default()
        .normalize(Service::InstantaneousValues, RawResponse::Json(json))
        .unwrap_err();
    assert!(err.is_empty_result());
}

#[test]
fn test_wrong_payload_kind_is_malformed() {
    let normalizer = ResponseNormalizer::default();

    let err = normalizer
        .normalize(Service::DailyValues, RawResponse::Text("site_no\n5s\n".to_string()))
        .unwrap_err();
    assert!(matches!(err, NwisError::MalformedResponse { .. }));

    let err = normalizer
        .normalize(Service::SiteDescription, RawResponse::Json(json!({})))
        .unwrap_err();
    assert!(matches!(err, NwisError::MalformedResponse { .. }));
}

#[test]
fn test_samples_without_time_columns_are_malformed() {
    let body = "agency_cd\tsite_no\n5s\t15s\nUSGS\t03339000\n".to_string();
    let err = ResponseNormalizer::default()
        .normalize(Service::WaterQualitySamples, RawResponse::Text(body))
        .unwrap_err();
    assert!(matches!(err, NwisError::MalformedResponse { .. }));
}
