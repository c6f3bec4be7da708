//! URLhaus (abuse.ch) lookups
//!
//! Keyless. Every lookup is a form POST against the endpoint matching the
//! indicator: `host/` for IPs and domains, `url/` for URLs, `payload/` for
//! MD5 or SHA256 hashes.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{endpoint, read_json};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::{HashKind, IndicatorKind};

const URLHAUS_API_BASE: &str = "https://urlhaus-api.abuse.ch/v1";

pub struct UrlhausClient {
    http: Client,
    base_url: String,
}

impl UrlhausClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: URLHAUS_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// (endpoint, form field) for a query kind
fn route(kind: IndicatorKind) -> Option<(&'static str, &'static str)> {
    match kind {
        IndicatorKind::Ip(_) | IndicatorKind::Domain => Some(("host", "host")),
        IndicatorKind::Url => Some(("url", "url")),
        IndicatorKind::Hash(HashKind::Md5) => Some(("payload", "md5_hash")),
        IndicatorKind::Hash(HashKind::Sha256) => Some(("payload", "sha256_hash")),
        IndicatorKind::Hash(HashKind::Sha1) | IndicatorKind::Email => None,
    }
}

#[async_trait]
impl ThreatIntelProvider for UrlhausClient {
    fn name(&self) -> ProviderName {
        ProviderName::Urlhaus
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        let kind = IndicatorKind::classify(query);
        let (path, field) = route(kind).ok_or(ProviderError::UnsupportedQuery {
            provider: self.name().as_str(),
            kind: kind.label(),
        })?;

        // trailing empty segment keeps the slash URLhaus expects
        let response = self.http
            .post(endpoint(&self.base_url, &[path, ""])?)
            .form(&[(field, query)])
            .send()
            .await?;

        read_json(response).await
    }
}
