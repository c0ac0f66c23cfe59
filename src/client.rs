//! Async HTTP client for the NWIS services.
//!
//! Fetches a response body for a [`RecordQuery`] and hands it to the
//! synchronous normalizer once the whole body has arrived.

use crate::config::NwisConfig;
use crate::error::Result;
use crate::models::{NormalizedTable, RawResponse, Service};
use crate::processor::ResponseNormalizer;
use crate::query::RecordQuery;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Client for the NWIS web services
#[derive(Debug, Clone)]
pub struct NwisClient {
    http: Client,
    config: NwisConfig,
    normalizer: ResponseNormalizer,
}

impl NwisClient {
    /// Create a client with the given configuration
    pub fn new(config: NwisConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("nwis_processor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let normalizer = ResponseNormalizer::from_config(&config);

        Ok(Self {
            http,
            config,
            normalizer,
        })
    }

    /// Fetch the raw response body for a query
    pub async fn fetch(&self, query: &RecordQuery) -> Result<RawResponse> {
        let request = query.build(&self.config)?;
        info!("Requesting {} from {}", query.service, request.url);
        debug!("Query parameters: {:?}", request.params);

        let response = self
            .http
            .get(&request.url)
            .query(&request.params)
            .send()
            .await?
            .error_for_status()?;

        if query.service.is_json() {
            let body: serde_json::Value = response.json().await?;
            Ok(RawResponse::Json(body))
        } else {
            let body = response.text().await?;
            debug!("Received {} bytes of RDB", body.len());
            Ok(RawResponse::Text(body))
        }
    }

    /// Fetch and normalize the records for a query
    pub async fn get_records(&self, query: &RecordQuery) -> Result<NormalizedTable> {
        let response = self.fetch(query).await?;
        let table = self.normalizer.normalize(query.service, response)?;
        info!(
            "Normalized {} response: {} rows, index {:?}",
            query.service,
            table.height(),
            table.index
        );
        Ok(table)
    }

    /// The complete NWIS parameter code catalogue
    pub async fn all_parameter_codes(&self) -> Result<NormalizedTable> {
        self.get_records(&RecordQuery::new(Service::ParameterCodes))
            .await
    }
}
