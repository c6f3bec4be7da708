//! MxToolbox lookups
//!
//! Domains and email addresses get an MX lookup on the (email) domain;
//! IPs get a blacklist check.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json, require_key};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::{host_of, IndicatorKind};

const MXTOOLBOX_API_BASE: &str = "https://mxtoolbox.com/api/v1";
const API_KEY_VAR: &str = "MXTOOLBOX_API_KEY";

pub struct MxToolboxClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl MxToolboxClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: MXTOOLBOX_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ThreatIntelProvider for MxToolboxClient {
    fn name(&self) -> ProviderName {
        ProviderName::MxToolbox
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = require_key(&self.api_key, API_KEY_VAR)?;

        let kind = IndicatorKind::classify(query);
        let (command, argument) = match kind {
            IndicatorKind::Ip(ip) => ("blacklist", ip.to_string()),
            IndicatorKind::Domain => ("mx", query.to_lowercase()),
            IndicatorKind::Email => match host_of(query) {
                Some(domain) => ("mx", domain),
                None => return Err(ProviderError::Malformed(format!("no domain in {}", query))),
            },
            _ => {
                return Err(ProviderError::UnsupportedQuery {
                    provider: self.name().as_str(),
                    kind: kind.label(),
                })
            }
        };

        let response = self.http
            .get(endpoint(&self.base_url, &["lookup", command, &argument])?)
            .header("Authorization", api_key)
            .send()
            .await?;

        read_json(response).await
    }
}
