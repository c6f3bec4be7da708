//! WHOIS (RDAP) and DNS lookup
//!
//! Keyless. IPs get an RDAP record; domains (also the host of a URL or
//! email) get RDAP plus a DNS-over-HTTPS A/MX resolution. The result is
//! `{"rdap": ..., "dns": ...}`; a DNS failure is embedded as an error
//! marker under `dns` without failing the RDAP half.

use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::http::{endpoint, read_json};
use super::{ProviderName, ThreatIntelProvider};
use crate::error::ProviderError;
use crate::indicator::{host_of, IndicatorKind};

const RDAP_BASE: &str = "https://rdap.org";
const DOH_BASE: &str = "https://dns.google/resolve";
const DNS_RECORD_TYPES: [&str; 2] = ["A", "MX"];

pub struct WhoisDnsClient {
    http: Client,
    rdap_base: String,
    dns_base: String,
}

enum Target {
    Ip(IpAddr),
    Domain(String),
}

impl WhoisDnsClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            rdap_base: RDAP_BASE.to_string(),
            dns_base: DOH_BASE.to_string(),
        }
    }

    pub fn with_base_urls(mut self, rdap_base: impl Into<String>, dns_base: impl Into<String>) -> Self {
        self.rdap_base = rdap_base.into();
        self.dns_base = dns_base.into();
        self
    }

    fn target(&self, query: &str) -> Result<Target, ProviderError> {
        let kind = IndicatorKind::classify(query);
        let host = match kind {
            IndicatorKind::Ip(ip) => return Ok(Target::Ip(ip)),
            IndicatorKind::Domain => Some(query.to_lowercase()),
            IndicatorKind::Url | IndicatorKind::Email => host_of(query),
            IndicatorKind::Hash(_) => None,
        };

        match host {
            Some(host) => Ok(match host.parse::<IpAddr>() {
                Ok(ip) => Target::Ip(ip),
                Err(_) => Target::Domain(host),
            }),
            None => Err(ProviderError::UnsupportedQuery {
                provider: self.name().as_str(),
                kind: kind.label(),
            }),
        }
    }

    async fn rdap(&self, resource: &str, value: &str) -> Result<Value, ProviderError> {
        let response = self.http
            .get(endpoint(&self.rdap_base, &[resource, value])?)
            .header("Accept", "application/rdap+json, application/json")
            .send()
            .await?;

        read_json(response).await
    }

    async fn resolve(&self, domain: &str) -> Result<Value, ProviderError> {
        let mut records = Map::new();

        for record_type in DNS_RECORD_TYPES {
            let response = self.http
                .get(&self.dns_base)
                .query(&[("name", domain), ("type", record_type)])
                .header("Accept", "application/dns-json")
                .send()
                .await?;

            records.insert(record_type.to_string(), read_json(response).await?);
        }

        Ok(Value::Object(records))
    }
}

#[async_trait]
impl ThreatIntelProvider for WhoisDnsClient {
    fn name(&self) -> ProviderName {
        ProviderName::WhoisDns
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        match self.target(query)? {
            Target::Ip(ip) => {
                let rdap = self.rdap("ip", &ip.to_string()).await?;
                Ok(json!({ "rdap": rdap }))
            }
            Target::Domain(domain) => {
                let (rdap, dns) = tokio::join!(self.rdap("domain", &domain), self.resolve(&domain));
                let dns = dns.unwrap_or_else(|e| e.to_marker());
                Ok(json!({ "rdap": rdap?, "dns": dns }))
            }
        }
    }
}
