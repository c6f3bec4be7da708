//! AlienVault OTX indicator lookup

use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::IndicatorKind;

const OTX_API_BASE: &str = "https://otx.alienvault.com/api/v1";
const API_KEY_VAR: &str = "OTX_API_KEY";

pub struct OtxClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OtxClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: OTX_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// OTX indicator section for a query kind
fn section(kind: IndicatorKind) -> Option<&'static str> {
    match kind {
        IndicatorKind::Ip(IpAddr::V4(_)) => Some("IPv4"),
        IndicatorKind::Ip(IpAddr::V6(_)) => Some("IPv6"),
        IndicatorKind::Domain => Some("domain"),
        IndicatorKind::Url => Some("url"),
        IndicatorKind::Hash(_) => Some("file"),
        IndicatorKind::Email => None,
    }
}

#[async_trait]
impl ThreatIntelProvider for OtxClient {
    fn name(&self) -> ProviderName {
        ProviderName::Otx
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = require_key(&self.api_key, API_KEY_VAR)?;

        let kind = IndicatorKind::classify(query);
        let section = section(kind).ok_or(ProviderError::UnsupportedQuery {
            provider: self.name().as_str(),
            kind: kind.label(),
        })?;

        let url = endpoint(&self.base_url, &["indicators", section, query, "general"])?;
        let response = self.http
            .get(url)
            .header("X-OTX-API-KEY", api_key)
            .send()
            .await?;

        read_json(response).await
    }
}
