//! MalwareBazaar (abuse.ch) sample lookup. Keyless, hashes only.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::IndicatorKind;

const MALWAREBAZAAR_API_BASE: &str = "https://mb-api.abuse.ch/api/v1";

pub struct MalwareBazaarClient {
    http: Client,
    base_url: String,
}

impl MalwareBazaarClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: MALWAREBAZAAR_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ThreatIntelProvider for MalwareBazaarClient {
    fn name(&self) -> ProviderName {
        ProviderName::Malwarebazaar
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        match IndicatorKind::classify(query) {
            IndicatorKind::Hash(_) => {}
            kind => {
                return Err(ProviderError::UnsupportedQuery {
                    provider: self.name().as_str(),
                    kind: kind.label(),
                })
            }
        }

        let response = self.http
            .post(endpoint(&self.base_url, &[""])?)
            .form(&[("query", "get_info"), ("hash", query)])
            .send()
            .await?;

        read_json(response).await
    }
}
