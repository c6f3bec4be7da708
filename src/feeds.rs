//! Public threat feeds
//!
//! Pulls the public IP, domain and hash blocklists and merges them into
//! `{"ips", "domains", "hashes"}` maps of indicator → status. Nothing is
//! stored: every call fetches the feeds again. Each feed runs as its own
//! task under the provider timeout; a feed that fails is reported as an
//! error marker under `sources` and contributes no indicators.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinSet;

use crate::aggregate::guarded;
use crate::config::Config;
use crate::error::ProviderError;
use crate::providers::http::check_status;

const MALICIOUS: &str = "malicious";
const MIN_HASH_LEN: usize = 32;

/// Which map a feed's indicators land in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedCategory {
    Ips,
    Domains,
    Hashes,
}

/// How a feed's body is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    /// One indicator per line; `#` lines and `;` trailers are comments
    Lines,
    /// OTX export: a JSON array (or `{"results": [...]}`) of `{"indicator"}`
    OtxIndicators,
}

#[derive(Debug, Clone)]
pub struct FeedSource {
    pub name: &'static str,
    pub category: FeedCategory,
    pub format: FeedFormat,
    pub url: String,
    /// Extra header sent with the request, e.g. an API key
    pub auth: Option<(&'static str, String)>,
}

impl FeedSource {
    pub fn new(name: &'static str, category: FeedCategory, format: FeedFormat, url: impl Into<String>) -> Self {
        Self {
            name,
            category,
            format,
            url: url.into(),
            auth: None,
        }
    }

    pub fn with_header(mut self, header: &'static str, value: impl Into<String>) -> Self {
        self.auth = Some((header, value.into()));
        self
    }

    /// Public feeds pulled by `GET /threats`
    pub fn defaults(otx_key: Option<&str>) -> Vec<Self> {
        let mut otx = FeedSource::new(
            "otx_domains",
            FeedCategory::Domains,
            FeedFormat::OtxIndicators,
            "https://otx.alienvault.com/api/v1/indicators/export?type=domain&limit=50",
        );
        if let Some(key) = otx_key {
            otx = otx.with_header("X-OTX-API-KEY", key);
        }

        vec![
            FeedSource::new(
                "abuseipdb_blacklist",
                FeedCategory::Ips,
                FeedFormat::Lines,
                "https://www.abuseipdb.com/blacklist?format=csv",
            ),
            FeedSource::new(
                "spamhaus_drop",
                FeedCategory::Ips,
                FeedFormat::Lines,
                "https://www.spamhaus.org/drop/drop.txt",
            ),
            otx,
            FeedSource::new(
                "malwarebazaar_recent",
                FeedCategory::Hashes,
                FeedFormat::Lines,
                "https://bazaar.abuse.ch/export/txt/recent/",
            ),
        ]
    }
}

/// Merged feed contents
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThreatFeedResponse {
    pub ips: BTreeMap<String, &'static str>,
    pub domains: BTreeMap<String, &'static str>,
    pub hashes: BTreeMap<String, &'static str>,
    /// Per feed: `{"category", "count"}` or an error marker
    pub sources: BTreeMap<&'static str, Value>,
}

impl ThreatFeedResponse {
    fn merge(&mut self, source: &FeedSource, result: Result<Vec<String>, ProviderError>) {
        match result {
            Ok(indicators) => {
                self.sources.insert(
                    source.name,
                    json!({ "category": source.category, "count": indicators.len() }),
                );
                let target = match source.category {
                    FeedCategory::Ips => &mut self.ips,
                    FeedCategory::Domains => &mut self.domains,
                    FeedCategory::Hashes => &mut self.hashes,
                };
                target.extend(indicators.into_iter().map(|i| (i, MALICIOUS)));
            }
            Err(e) => {
                tracing::warn!("Feed {} failed: {}", source.name, e);
                self.sources.insert(source.name, e.to_marker());
            }
        }
    }
}

/// Fetches every configured feed over the shared HTTP client
pub struct ThreatFeeds {
    http: Client,
    sources: Vec<FeedSource>,
    timeout: Duration,
}

impl ThreatFeeds {
    pub fn new(http: Client, sources: Vec<FeedSource>, timeout: Duration) -> Self {
        Self { http, sources, timeout }
    }

    pub fn from_config(config: &Config, http: Client) -> Self {
        Self::new(
            http,
            FeedSource::defaults(config.keys.otx.as_deref()),
            config.provider_timeout,
        )
    }

    pub async fn fetch_all(&self) -> ThreatFeedResponse {
        let started = Instant::now();
        let mut response = ThreatFeedResponse::default();
        let mut join_set = JoinSet::new();

        for source in &self.sources {
            let source = source.clone();
            let http = self.http.clone();
            let timeout = self.timeout;

            join_set.spawn(async move {
                let result = guarded(fetch_feed(&http, &source), timeout).await;
                (source, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((source, result)) => response.merge(&source, result),
                Err(e) => tracing::warn!("Feed task did not complete: {}", e),
            }
        }

        tracing::info!(
            "Threat feeds refreshed in {}ms ({} ips, {} domains, {} hashes)",
            started.elapsed().as_millis(),
            response.ips.len(),
            response.domains.len(),
            response.hashes.len()
        );

        response
    }
}

async fn fetch_feed(http: &Client, source: &FeedSource) -> Result<Vec<String>, ProviderError> {
    let mut request = http.get(&source.url);
    if let Some((header, value)) = &source.auth {
        request = request.header(*header, value);
    }

    let response = request.send().await?;
    check_status(response.status())?;
    let body = response.text().await?;

    match source.format {
        FeedFormat::Lines => Ok(parse_lines(&body, source.category)),
        FeedFormat::OtxIndicators => parse_otx(&body),
    }
}

fn parse_lines(body: &str, category: FeedCategory) -> Vec<String> {
    body.lines()
        .map(|line| line.split(';').next().unwrap_or_default().trim())
        .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
        .filter(|entry| match category {
            FeedCategory::Hashes => {
                entry.len() >= MIN_HASH_LEN && entry.chars().all(|c| c.is_ascii_hexdigit())
            }
            _ => true,
        })
        .map(str::to_string)
        .collect()
}

fn parse_otx(body: &str) -> Result<Vec<String>, ProviderError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Malformed("expected a results array".to_string()))?,
        _ => return Err(ProviderError::Malformed("expected an indicator array".to_string())),
    };

    Ok(items
        .iter()
        .filter_map(|item| item.get("indicator").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines_skips_comments() {
        let body = "; Spamhaus DROP List\n1.10.16.0/20 ; SBL256894\n\n# note\n2.56.192.0/22 ; SBL459831\n";
        assert_eq!(
            parse_lines(body, FeedCategory::Ips),
            vec!["1.10.16.0/20".to_string(), "2.56.192.0/22".to_string()]
        );
    }

    #[test]
    fn test_parse_lines_filters_short_hashes() {
        let body = "# header\n44d88612fea8a8f36de82e1278abb02f\nnot-a-hash\nabc123\n";
        assert_eq!(
            parse_lines(body, FeedCategory::Hashes),
            vec!["44d88612fea8a8f36de82e1278abb02f".to_string()]
        );
    }

    #[test]
    fn test_parse_otx_shapes() {
        let array = r#"[{"indicator": "evil.example"}, {"type": "domain"}]"#;
        assert_eq!(parse_otx(array).unwrap(), vec!["evil.example".to_string()]);

        let wrapped = r#"{"results": [{"indicator": "bad.example"}]}"#;
        assert_eq!(parse_otx(wrapped).unwrap(), vec!["bad.example".to_string()]);

        assert!(matches!(parse_otx("42"), Err(ProviderError::Malformed(_))));
        assert!(matches!(parse_otx("<html>"), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn test_defaults_attach_otx_key() {
        let sources = FeedSource::defaults(Some("k"));
        let otx = sources.iter().find(|s| s.name == "otx_domains").unwrap();
        assert_eq!(otx.auth, Some(("X-OTX-API-KEY", "k".to_string())));

        let sources = FeedSource::defaults(None);
        assert!(sources.iter().all(|s| s.auth.is_none()));
    }
}
