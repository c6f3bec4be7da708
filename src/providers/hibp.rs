//! Have I Been Pwned breach lookup (email addresses only)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::IndicatorKind;

const HIBP_API_BASE: &str = "https://haveibeenpwned.com/api/v3";
const API_KEY_VAR: &str = "HIBP_API_KEY";

pub struct HibpClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl HibpClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: HIBP_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ThreatIntelProvider for HibpClient {
    fn name(&self) -> ProviderName {
        ProviderName::Hibp
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = require_key(&self.api_key, API_KEY_VAR)?;

        match IndicatorKind::classify(query) {
            IndicatorKind::Email => {}
            kind => {
                return Err(ProviderError::UnsupportedQuery {
                    provider: self.name().as_str(),
                    kind: kind.label(),
                })
            }
        }

        let response = self.http
            .get(endpoint(&self.base_url, &["breachedaccount", query])?)
            .query(&[("truncateResponse", "false")])
            .header("hibp-api-key", api_key)
            .send()
            .await?;

        // 404 means the account appears in no breach
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(json!([]));
        }

        read_json(response).await
    }
}
