//! AbuseIPDB IP reputation check

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::IndicatorKind;

const ABUSEIPDB_API_BASE: &str = "https://api.abuseipdb.com/api/v2";
const API_KEY_VAR: &str = "ABUSEIPDB_API_KEY";
const MAX_AGE_DAYS: &str = "90";

pub struct AbuseIpDbClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AbuseIpDbClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: ABUSEIPDB_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ThreatIntelProvider for AbuseIpDbClient {
    fn name(&self) -> ProviderName {
        ProviderName::Abuseipdb
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
            .get(endpoint(&self.base_url, &["check"])?)
            .query(&[("ipAddress", ip.as_str()), ("maxAgeInDays", MAX_AGE_DAYS)])
            .header("Key", api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        read_json(response).await
    }
}
