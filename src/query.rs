//! Request construction for the NWIS services.
//!
//! A [`RecordQuery`] describes what to retrieve; [`RecordQuery::build`]
//! turns it into a concrete URL and an ordered list of query pairs. No
//! network work happens here, so filter problems surface before any request
//! is sent.

use crate::config::NwisConfig;
use crate::constants::PMCODES_PAYLOAD;
use crate::error::{NwisError, Result};
use crate::models::{ListArg, Service};

/// A concrete HTTP GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RequestSpec {
    fn new(url: String) -> Self {
        Self {
            url,
            params: Vec::new(),
        }
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.params.push((key.to_string(), value.into()));
    }

    /// Value of the first pair with the given key
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// What to retrieve from NWIS
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub service: Service,
    pub sites: Option<ListArg>,
    pub state_cd: Option<ListArg>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub params: Option<ListArg>,
}

impl RecordQuery {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            sites: None,
            state_cd: None,
            start: None,
            end: None,
            params: None,
        }
    }

    pub fn with_sites(mut self, sites: impl Into<ListArg>) -> Self {
        self.sites = Some(sites.into());
        self
    }

    pub fn with_state_cd(mut self, state_cd: impl Into<ListArg>) -> Self {
        self.state_cd = Some(state_cd.into());
        self
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn with_params(mut self, params: impl Into<ListArg>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Resolve the query against the configured endpoints
    pub fn build(&self, config: &NwisConfig) -> Result<RequestSpec> {
        match self.service {
            Service::InstantaneousValues | Service::DailyValues => {
                let sites = self.required_sites()?;
                let mut spec =
                    RequestSpec::new(config.waterservices_endpoint(&format!("{}/", self.service)));
                spec.push("sites", sites);
                spec.push("format", "json");
                if let Some(start) = non_empty(&self.start) {
                    spec.push("startDT", start);
                }
                if let Some(end) = non_empty(&self.end) {
                    spec.push("endDT", end);
                }
                if let Some(params) = list_value(&self.params) {
                    spec.push("parameterCd", params);
                }
                Ok(spec)
            }
            Service::WaterQualitySamples => {
                let mut spec = RequestSpec::new(config.qwdata_url.clone());
                for (key, value) in &config.sample_defaults {
                    spec.push(key, value.as_str());
                }
                if let Some(sites) = list_value(&self.sites) {
                    spec.push("site_no", sites);
                } else if let Some(state_cd) = list_value(&self.state_cd) {
                    spec.push("state_cd", state_cd);
                } else {
                    return Err(NwisError::configuration("Site or state must be defined"));
                }
                if let Some(start) = non_empty(&self.start) {
                    spec.push("begin_date", start);
                }
                if let Some(end) = non_empty(&self.end) {
                    spec.push("end_date", end);
                }
                Ok(spec)
            }
            Service::SiteDescription => {
                let sites = self.required_sites()?;
                let mut spec = RequestSpec::new(config.waterservices_endpoint("site"));
                spec.push("sites", sites);
                spec.push("format", "rdb");
                Ok(spec)
            }
            Service::DischargeMeasurements => {
                let sites = self.required_sites()?;
                let mut spec = RequestSpec::new(config.waterdata_endpoint("measurements"));
                spec.push("search_site_no", sites);
                spec.push("format", "rdb");
                Ok(spec)
            }
            Service::ParameterCodes => {
                let mut spec = RequestSpec::new(config.pmcodes_url.clone());
                for (key, value) in PMCODES_PAYLOAD {
                    spec.push(key, *value);
                }
                Ok(spec)
            }
        }
    }

    fn required_sites(&self) -> Result<String> {
        list_value(&self.sites).ok_or_else(|| {
            NwisError::configuration(format!("Service '{}' requires at least one site", self.service))
        })
    }
}

fn list_value(arg: &Option<ListArg>) -> Option<String> {
    arg.as_ref()
        .filter(|list| !list.is_empty())
        .map(ListArg::to_query_value)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
