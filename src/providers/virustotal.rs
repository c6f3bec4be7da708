//! VirusTotal Integration
//!
//! Looks up IPs, domains, URLs and file hashes against the v3 API.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::IndicatorKind;

const VT_API_BASE: &str = "https://www.virustotal.com/api/v3";
const API_KEY_VAR: &str = "VIRUSTOTAL_API_KEY";

pub struct VirusTotalClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl VirusTotalClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: VT_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// VT identifies URLs by their unpadded URL-safe base64 form
fn url_id(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

#[async_trait]
impl ThreatIntelProvider for VirusTotalClient {
    fn name(&self) -> ProviderName {
        ProviderName::Virustotal
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = require_key(&self.api_key, API_KEY_VAR)?;

        let url = match IndicatorKind::classify(query) {
            IndicatorKind::Ip(ip) => endpoint(&self.base_url, &["ip_addresses", &ip.to_string()])?,
            IndicatorKind::Domain => endpoint(&self.base_url, &["domains", query])?,
            IndicatorKind::Url => endpoint(&self.base_url, &["urls", &url_id(query)])?,
            IndicatorKind::Hash(_) => endpoint(&self.base_url, &["files", query])?,
            kind @ IndicatorKind::Email => {
                return Err(ProviderError::UnsupportedQuery {
                    provider: self.name().as_str(),
                    kind: kind.label(),
                })
            }
        };

        let response = self.http
            .get(url)
            .header("x-apikey", api_key)
            .send()
            .await?;

        read_json(response).await
    }
}
