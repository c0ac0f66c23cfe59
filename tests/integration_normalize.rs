//! Integration tests for normalization through the public API
//!
//! Uses saved response bodies written to temporary files, the same way the
//! `parse` command consumes them.

use nwis_processor::{
    NormalizedTable, NwisConfig, RawResponse, RecordQuery, ResponseNormalizer, Service,
    TableIndex, TableWriter,
};
use polars::prelude::*;
use std::fs;
use tempfile::TempDir;

const IV_TWO_SITES: &str = r#"{
  "name": "ns1:timeSeriesResponseType",
  "value": {
    "queryInfo": {"queryURL": "http://waterservices.usgs.gov/nwis/iv/"},
    "timeSeries": [
      {
        "sourceInfo": {"siteName": "ILLINOIS RIVER AT FLORENCE, IL", "siteCode": [{"value": "05586300", "network": "NWIS", "agencyCode": "USGS"}]},
        "variable": {"variableCode": [{"value": "00060", "network": "NWIS"}], "noDataValue": -999999.0},
        "values": [
          {"value": [
            {"value": "12000", "qualifiers": ["P"], "dateTime": "2018-01-24T00:00:00.000-06:00"},
            {"value": "12100", "qualifiers": ["P"], "dateTime": "2018-01-24T00:15:00.000-06:00"}
          ], "method": [{"methodDescription": "", "methodID": 69928}]}
        ]
      },
      {
        "sourceInfo": {"siteName": "VERMILION RIVER NEAR DANVILLE, IL", "siteCode": [{"value": "03339000", "network": "NWIS", "agencyCode": "USGS"}]},
        "variable": {"variableCode": [{"value": "00060", "network": "NWIS"}], "noDataValue": -999999.0},
        "values": [
          {"value": [
            {"value": "801", "qualifiers": ["P"], "dateTime": "2018-01-24T00:00:00.000-06:00"}
          ], "method": [{"methodDescription": "", "methodID": 69929}]}
        ]
      }
    ]
  }
}"#;

const SITE_RDB: &str = "#\n\
# US Geological Survey\n\
#\n\
agency_cd\tsite_no\tstation_nm\n\
5s\t15s\t50s\n\
USGS\t03339000\tVERMILION RIVER NEAR DANVILLE, IL\n";

fn normalize_file(service: Service, contents: &str) -> NormalizedTable {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("response.txt");
    fs::write(&path, contents).unwrap();

    let body = fs::read_to_string(&path).unwrap();
    let response = if service.is_json() {
        RawResponse::Json(serde_json::from_str(&body).unwrap())
    } else {
        RawResponse::Text(body)
    };
    ResponseNormalizer::default().normalize(service, response).unwrap()
}

#[test]
fn test_two_site_iv_response_to_parquet() {
    let table = normalize_file(Service::InstantaneousValues, IV_TWO_SITES);

    assert_eq!(table.index, TableIndex::SiteDatetime);
    assert_eq!(table.height(), 3);

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("iv.parquet");
    let written = TableWriter::new(&output).unwrap().write(&table).unwrap();
    assert_eq!(written, 3);

    let read = ParquetReader::new(fs::File::open(&output).unwrap())
        .finish()
        .unwrap();
    let sites: Vec<Option<&str>> = read
        .column("site_no")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(sites, vec![Some("03339000"), Some("05586300"), Some("05586300")]);
}

#[test]
fn test_site_description_keeps_site_number() {
    let table = normalize_file(Service::SiteDescription, SITE_RDB);

    assert_eq!(table.index, TableIndex::None);
    assert_eq!(
        table.frame.column("site_no").unwrap().str().unwrap().get(0),
        Some("03339000")
    );
}

#[test]
fn test_query_and_normalizer_share_configuration() {
    let config = NwisConfig::default().with_base_url("http://localhost:9");
    let spec = RecordQuery::new(Service::SiteDescription)
        .with_sites("03339000")
        .build(&config)
        .unwrap();
    assert_eq!(spec.url, "http://localhost:9/nwis/site");

    let err = ResponseNormalizer::from_config(&config)
        .normalize(
            Service::SiteDescription,
            RawResponse::Text("No sites/data found using the selection criteria specified \n".into()),
        )
        .unwrap_err();
    assert!(err.is_empty_result());
}
