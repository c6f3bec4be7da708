//! Configuration module

use std::env;
use std::time::Duration;

/// Default per-provider timeout in seconds
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 8;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Upper bound for a single provider lookup
    pub provider_timeout: Duration,

    /// Provider API keys
    pub keys: ProviderKeys,
}

/// API keys for the providers that require authentication.
///
/// A missing key is not a startup error: the affected provider reports it
/// in its own slot of every aggregate response.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub virustotal: Option<String>,
    pub abuseipdb: Option<String>,
    pub otx: Option<String>,
    pub shodan: Option<String>,
    pub greynoise: Option<String>,
    pub mx_toolbox: Option<String>,
    pub hibp: Option<String>,
}

impl ProviderKeys {
    /// Load every provider key from the environment
    pub fn from_env() -> Self {
        Self {
            virustotal: key_var("VIRUSTOTAL_API_KEY"),
            abuseipdb: key_var("ABUSEIPDB_API_KEY"),
            otx: key_var("OTX_API_KEY"),
            shodan: key_var("SHODAN_API_KEY"),
            greynoise: key_var("GREYNOISE_API_KEY"),
            mx_toolbox: key_var("MXTOOLBOX_API_KEY"),
            hibp: key_var("HIBP_API_KEY"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            provider_timeout: Duration::from_secs(
                env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs: &u64| *secs > 0)
                    .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            ),

            keys: ProviderKeys::from_env(),
        }
    }
}

fn key_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_missing() {
        env::set_var("CTI_TEST_BLANK_KEY", "   ");
        assert_eq!(key_var("CTI_TEST_BLANK_KEY"), None);

        env::set_var("CTI_TEST_SET_KEY", " abc ");
        assert_eq!(key_var("CTI_TEST_SET_KEY"), Some("abc".to_string()));

        assert_eq!(key_var("CTI_TEST_UNSET_KEY_NEVER_DEFINED"), None);
    }
}
