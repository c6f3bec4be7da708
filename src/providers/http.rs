//! Shared HTTP plumbing for provider clients

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Create the HTTP client shared by every provider
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
        .user_agent(concat!("cti-lookup/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base)
        .map_err(|e| ProviderError::Network(format!("invalid base URL {}: {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| ProviderError::Network(format!("base URL cannot have a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

pub(crate) fn require_key<'a>(
    key: &'a Option<String>,
    env_var: &'static str,
) -> Result<&'a str, ProviderError> {
    key.as_deref().ok_or(ProviderError::MissingApiKey(env_var))
}

/// Map the upstream status, then parse the body as JSON
pub(crate) async fn read_json(response: Response) -> Result<Value, ProviderError> {
    check_status(response.status())?;

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

pub(crate) fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
        s if !s.is_success() => Err(ProviderError::UpstreamStatus(s.as_u16())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint("https://api.example/v1/", &["indicators", "url", "http://a.b/c?d"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example/v1/indicators/url/http:%2F%2Fa.b%2Fc%3Fd"
        );

        let url = endpoint("https://api.example/v1", &["host", "1.2.3.4"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example/v1/host/1.2.3.4");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(check_status(StatusCode::FORBIDDEN), Err(ProviderError::Unauthorized)));
        assert!(matches!(check_status(StatusCode::NOT_FOUND), Err(ProviderError::NotFound)));
        assert!(matches!(check_status(StatusCode::TOO_MANY_REQUESTS), Err(ProviderError::RateLimited)));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(ProviderError::UpstreamStatus(502))
        ));
    }

    #[test]
    fn test_require_key() {
        assert_eq!(require_key(&Some("k".to_string()), "X_KEY").unwrap(), "k");
        assert!(matches!(require_key(&None, "X_KEY"), Err(ProviderError::MissingApiKey("X_KEY"))));
    }
}
