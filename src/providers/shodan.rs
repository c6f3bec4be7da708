//! Shodan host and DNS lookup
//!
//! IPs go to the host endpoint; domains (and URL hosts) to the DNS
//! domain endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::{host_of, IndicatorKind};

const SHODAN_API_BASE: &str = "https://api.shodan.io";
const API_KEY_VAR: &str = "SHODAN_API_KEY";

pub struct ShodanClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ShodanClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: SHODAN_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn target(&self, query: &str) -> Result<(&'static str, &'static str, String), ProviderError> {
        let kind = IndicatorKind::classify(query);
        let host = match kind {
            IndicatorKind::Ip(ip) => return Ok(("shodan", "host", ip.to_string())),
            IndicatorKind::Domain => Some(query.to_lowercase()),
            IndicatorKind::Url => host_of(query),
            _ => None,
        };

        match host {
            Some(host) => match host.parse::<std::net::IpAddr>() {
                Ok(ip) => Ok(("shodan", "host", ip.to_string())),
                Err(_) => Ok(("dns", "domain", host)),
            },
            None => Err(ProviderError::UnsupportedQuery {
                provider: self.name().as_str(),
                kind: kind.label(),
            }),
        }
    }
}

#[async_trait]
impl ThreatIntelProvider for ShodanClient {
    fn name(&self) -> ProviderName {
        ProviderName::Shodan
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = require_key(&self.api_key, API_KEY_VAR)?;
        let (area, resource, target) = self.target(query)?;

        let response = self.http
            .get(endpoint(&self.base_url, &[area, resource, &target])?)
            .query(&[("key", api_key)])
            .send()
            .await?;

        read_json(response).await
    }
}
