//! Indicator classification
//!
//! The aggregation endpoint passes the query verbatim to every provider.
//! Provider clients use [`IndicatorKind::classify`] to pick the upstream
//! endpoint that matches the query.

use std::fmt;
use std::net::IpAddr;

/// Kind of indicator a query string looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Ip(IpAddr),
    Domain,
    Url,
    Hash(HashKind),
    Email,
}

/// File hash flavours, by hex length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

impl IndicatorKind {
    pub fn classify(query: &str) -> Self {
        let query = query.trim();

        if let Ok(ip) = query.parse::<IpAddr>() {
            return IndicatorKind::Ip(ip);
        }
        if query.contains("://") {
            return IndicatorKind::Url;
        }
        if is_email(query) {
            return IndicatorKind::Email;
        }
        if let Some(hash) = hash_kind(query) {
            return IndicatorKind::Hash(hash);
        }

        IndicatorKind::Domain
    }

    /// Short label used in error markers and request logs
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Ip(_) => "ip",
            IndicatorKind::Domain => "domain",
            IndicatorKind::Url => "url",
            IndicatorKind::Hash(_) => "hash",
            IndicatorKind::Email => "email",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host part of a URL or email query, lowercased.
///
/// Returns `None` for other kinds or unparsable URLs.
pub fn host_of(query: &str) -> Option<String> {
    let query = query.trim();
    match IndicatorKind::classify(query) {
        IndicatorKind::Url => url::Url::parse(query)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_matches(|c| c == '[' || c == ']').to_lowercase())),
        IndicatorKind::Email => query
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase()),
        _ => None,
    }
}

fn is_email(query: &str) -> bool {
    match query.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !query.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn hash_kind(query: &str) -> Option<HashKind> {
    if !query.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match query.len() {
        32 => Some(HashKind::Md5),
        40 => Some(HashKind::Sha1),
        64 => Some(HashKind::Sha256),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ip() {
        assert!(matches!(IndicatorKind::classify("8.8.8.8"), IndicatorKind::Ip(IpAddr::V4(_))));
        assert!(matches!(IndicatorKind::classify("2001:4860:4860::8888"), IndicatorKind::Ip(IpAddr::V6(_))));
        assert!(matches!(IndicatorKind::classify(" 1.1.1.1 "), IndicatorKind::Ip(_)));
    }

    #[test]
    fn test_classify_hashes() {
        assert_eq!(
            IndicatorKind::classify("44d88612fea8a8f36de82e1278abb02f"),
            IndicatorKind::Hash(HashKind::Md5)
        );
        assert_eq!(
            IndicatorKind::classify("3395856ce81f2b7382dee72602f798b642f14140"),
            IndicatorKind::Hash(HashKind::Sha1)
        );
        assert_eq!(
            IndicatorKind::classify("275a021bbfb6489e54d471899f7db9d1663fc695ec2fe2a2c4538aabf651fd0f"),
            IndicatorKind::Hash(HashKind::Sha256)
        );
        // wrong length falls back to domain-like
        assert_eq!(IndicatorKind::classify("abcdef"), IndicatorKind::Domain);
    }

    #[test]
    fn test_classify_url_email_domain() {
        assert_eq!(IndicatorKind::classify("https://evil.example/payload.exe"), IndicatorKind::Url);
        assert_eq!(IndicatorKind::classify("alice@example.com"), IndicatorKind::Email);
        assert_eq!(IndicatorKind::classify("example.com"), IndicatorKind::Domain);
        assert_eq!(IndicatorKind::classify("alice@localhost"), IndicatorKind::Domain);
    }

    #[test]
    fn test_display_is_kind_only() {
        let queries = ["10.0.0.5", "alice@example.com", "https://evil.example/a?token=s3cret"];
        for query in queries {
            let rendered = IndicatorKind::classify(query).to_string();
            assert!(!rendered.contains(query));
            assert!(["ip", "domain", "url", "hash", "email"].contains(&rendered.as_str()));
        }
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://Evil.Example:8443/x?y=1"), Some("evil.example".to_string()));
        assert_eq!(host_of("http://[::1]/"), Some("::1".to_string()));
        assert_eq!(host_of("bob@Mail.Example.org"), Some("mail.example.org".to_string()));
        assert_eq!(host_of("example.com"), None);
    }
}
