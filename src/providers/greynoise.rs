//! GreyNoise community API

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::IndicatorKind;

const GREYNOISE_API_BASE: &str = "https://api.greynoise.io/v3";
const API_KEY_VAR: &str = "GREYNOISE_API_KEY";

pub struct GreyNoiseClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GreyNoiseClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: GREYNOISE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ThreatIntelProvider for GreyNoiseClient {
    fn name(&self) -> ProviderName {
        ProviderName::Greynoise
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = require_key(&self.api_key, API_KEY_VAR)?;

        let ip = match IndicatorKind::classify(query) {
            IndicatorKind::Ip(ip) => ip.to_string(),
            kind => {
                return Err(ProviderError::UnsupportedQuery {
                    provider: self.name().as_str(),
                    kind: kind.label(),
                })
            }
        };

        let response = self.http
            .get(endpoint(&self.base_url, &["community", &ip])?)
            .header("key", api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        read_json(response).await
    }
}
