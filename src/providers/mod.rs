//! Threat-intelligence provider clients
//!
//! Every provider exposes one capability, [`ThreatIntelProvider::lookup`].
//! The aggregation layer depends only on that trait and on the fixed
//! [`ProviderName`] set, so tests can swap in mock providers.

pub(crate) mod http;

pub mod abuseipdb;
pub mod greynoise;
pub mod hibp;
pub mod malwarebazaar;
pub mod mx_toolbox;
pub mod otx;
pub mod shodan;
pub mod urlhaus;
pub mod virustotal;
pub mod whois_dns;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::ProviderError;

pub use http::build_http_client;

// ============================================================================
// PROVIDER NAMES
// ============================================================================

/// The fixed, exhaustive set of providers in every aggregate response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    Virustotal,
    Abuseipdb,
    Otx,
    Shodan,
    Greynoise,
    Urlhaus,
    Malwarebazaar,
    MxToolbox,
    WhoisDns,
    Hibp,
}

impl ProviderName {
    pub const ALL: [ProviderName; 10] = [
        ProviderName::Virustotal,
        ProviderName::Abuseipdb,
        ProviderName::Otx,
        ProviderName::Shodan,
        ProviderName::Greynoise,
        ProviderName::Urlhaus,
        ProviderName::Malwarebazaar,
        ProviderName::MxToolbox,
        ProviderName::WhoisDns,
        ProviderName::Hibp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Virustotal => "virustotal",
            ProviderName::Abuseipdb => "abuseipdb",
            ProviderName::Otx => "otx",
            ProviderName::Shodan => "shodan",
            ProviderName::Greynoise => "greynoise",
            ProviderName::Urlhaus => "urlhaus",
            ProviderName::Malwarebazaar => "malwarebazaar",
            ProviderName::MxToolbox => "mx_toolbox",
            ProviderName::WhoisDns => "whois_dns",
            ProviderName::Hibp => "hibp",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown provider '{}'", s))
    }
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

#[async_trait]
pub trait ThreatIntelProvider: Send + Sync {
    /// Slot this provider fills in the aggregate response
    fn name(&self) -> ProviderName;

    /// Whether the credentials this provider needs are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Look up one query and return the provider's raw JSON
    async fn lookup(&self, query: &str) -> Result<Value, ProviderError>;
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Provider set built once at startup and shared by all requests
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ThreatIntelProvider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn ThreatIntelProvider>>) -> Self {
        Self { providers }
    }

    /// Build the ten real provider clients over one shared HTTP client
    pub fn from_config(config: &Config, client: Client) -> Self {
        let keys = &config.keys;

        Self::new(vec![
            Arc::new(virustotal::VirusTotalClient::new(client.clone(), keys.virustotal.clone())),
            Arc::new(abuseipdb::AbuseIpDbClient::new(client.clone(), keys.abuseipdb.clone())),
            Arc::new(otx::OtxClient::new(client.clone(), keys.otx.clone())),
            Arc::new(shodan::ShodanClient::new(client.clone(), keys.shodan.clone())),
            Arc::new(greynoise::GreyNoiseClient::new(client.clone(), keys.greynoise.clone())),
            Arc::new(urlhaus::UrlhausClient::new(client.clone())),
            Arc::new(malwarebazaar::MalwareBazaarClient::new(client.clone())),
            Arc::new(mx_toolbox::MxToolboxClient::new(client.clone(), keys.mx_toolbox.clone())),
            Arc::new(whois_dns::WhoisDnsClient::new(client.clone())),
            Arc::new(hibp::HibpClient::new(client, keys.hibp.clone())),
        ])
    }

    pub fn get(&self, name: ProviderName) -> Option<&Arc<dyn ThreatIntelProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ThreatIntelProvider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
