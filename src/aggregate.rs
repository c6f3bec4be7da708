//! Fan-out of one query to every registered provider
//!
//! ```text
//!            query
//!              │
//!     ┌────────┼─────────────── ... ──┐
//!     ▼        ▼                      ▼
//!  [task]   [task]                 [task]     one task per provider,
//!  timeout  timeout                timeout    panics caught in-task
//!     │        │                      │
//!     └────────┴──────► slot map ◄────┘       10 keys, pre-filled
//! ```
//!
//! Provider failures never escape: each is rendered as an error marker in
//! that provider's slot, and the slot map starts with a placeholder for
//! every provider so the response always carries all ten keys.

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinSet;

use crate::error::ProviderError;
use crate::indicator::IndicatorKind;
use crate::providers::{ProviderName, ProviderRegistry, ThreatIntelProvider};

/// Placeholder left in a slot whose lookup never reported back
pub const PENDING_MARKER: &str = "lookup did not complete";

/// Combined results for one query, keyed by provider name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateResponse(BTreeMap<ProviderName, Value>);

impl AggregateResponse {
    /// Every provider slot set to the pending placeholder
    pub fn pending() -> Self {
        Self(
            ProviderName::ALL
                .into_iter()
                .map(|name| (name, json!({ "error": PENDING_MARKER })))
                .collect(),
        )
    }

    pub fn get(&self, name: ProviderName) -> Option<&Value> {
        self.0.get(&name)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of slots holding an error marker
    fn error_count(&self) -> usize {
        self.0.values().filter(|v| is_error_marker(v)).count()
    }

    fn fill(&mut self, name: ProviderName, result: Result<Value, ProviderError>) {
        let value = result.unwrap_or_else(|e| e.to_marker());
        self.0.insert(name, value);
    }
}

/// True for `{"error": "..."}` slot values
pub fn is_error_marker(value: &Value) -> bool {
    value
        .as_object()
        .map(|o| o.len() == 1 && o.get("error").map_or(false, Value::is_string))
        .unwrap_or(false)
}

/// Dispatches lookups over the injected provider registry
pub struct Aggregator {
    registry: ProviderRegistry,
    provider_timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: ProviderRegistry, provider_timeout: Duration) -> Self {
        Self {
            registry,
            provider_timeout,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Look up `query` against every provider concurrently
    pub async fn lookup_all(&self, query: &str) -> AggregateResponse {
        let started = Instant::now();
        let mut results = AggregateResponse::pending();
        let mut join_set = JoinSet::new();

        for provider in self.registry.iter() {
            let provider = Arc::clone(provider);
            let query = query.to_string();
            let timeout = self.provider_timeout;

            join_set.spawn(async move {
                let name = provider.name();
                let result = guarded_lookup(provider, &query, timeout).await;
                (name, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, result)) => {
                    log_outcome(name, &result);
                    results.fill(name, result);
                }
                // panics are caught in-task; only runtime shutdown lands here
                Err(e) => tracing::warn!("Provider task did not complete: {}", e),
            }
        }

        tracing::debug!("Lookup query: {}", query);
        tracing::info!(
            "Lookup ({}) finished in {}ms ({} ok, {} failed)",
            IndicatorKind::classify(query),
            started.elapsed().as_millis(),
            results.len() - results.error_count(),
            results.error_count()
        );

        results
    }

    /// Look up `query` against a single provider
    ///
    /// Returns `None` when no provider is registered under `name`.
    pub async fn lookup_one(&self, name: ProviderName, query: &str) -> Option<Value> {
        let provider = Arc::clone(self.registry.get(name)?);
        let result = guarded_lookup(provider, query, self.provider_timeout).await;
        log_outcome(name, &result);

        Some(result.unwrap_or_else(|e| e.to_marker()))
    }
}

/// Run one provider lookup under the timeout, turning a panic into an error
async fn guarded_lookup(
    provider: Arc<dyn ThreatIntelProvider>,
    query: &str,
    timeout: Duration,
) -> Result<Value, ProviderError> {
    guarded(provider.lookup(query), timeout).await
}

/// Bound `work` by `timeout` and catch any panic it raises
pub(crate) async fn guarded<F, T>(work: F, timeout: Duration) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let bounded = tokio::time::timeout(timeout, work);

    match AssertUnwindSafe(bounded).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ProviderError::Timeout(timeout)),
        Err(panic) => Err(ProviderError::Aborted(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "lookup panicked".to_string())
}

fn log_outcome(name: ProviderName, result: &Result<Value, ProviderError>) {
    match result {
        Ok(_) => tracing::debug!("Provider {} returned a result", name),
        Err(e) => tracing::warn!("Provider {} failed: {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    enum Behavior {
        Echo,
        Fail,
        Hang,
        Panic,
    }

    struct StubProvider {
        name: ProviderName,
        behavior: Behavior,
    }

    #[async_trait]
    impl ThreatIntelProvider for StubProvider {
        fn name(&self) -> ProviderName {
            self.name
        }

        async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
            match self.behavior {
                Behavior::Echo => Ok(json!({ "source": self.name.as_str(), "query": query })),
                Behavior::Fail => Err(ProviderError::Unauthorized),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(json!({}))
                }
                Behavior::Panic => panic!("stub exploded"),
            }
        }
    }

    fn aggregator(behavior_for: impl Fn(ProviderName) -> Behavior) -> Aggregator {
        let providers = ProviderName::ALL
            .into_iter()
            .map(|name| {
                Arc::new(StubProvider { name, behavior: behavior_for(name) }) as Arc<dyn ThreatIntelProvider>
            })
            .collect();
        Aggregator::new(ProviderRegistry::new(providers), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_all_providers_succeed() {
        let agg = aggregator(|_| Behavior::Echo);
        let results = agg.lookup_all("8.8.8.8").await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.error_count(), 0);
        for name in ProviderName::ALL {
            assert_eq!(results.get(name).unwrap()["query"], "8.8.8.8");
            assert_eq!(results.get(name).unwrap()["source"], name.as_str());
        }
    }

    #[tokio::test]
    async fn test_failure_timeout_and_panic_are_isolated() {
        let agg = aggregator(|name| match name {
            ProviderName::Shodan => Behavior::Fail,
            ProviderName::Hibp => Behavior::Hang,
            ProviderName::Otx => Behavior::Panic,
            _ => Behavior::Echo,
        });
        let results = agg.lookup_all("example.com").await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.error_count(), 3);
        assert_eq!(
            results.get(ProviderName::Shodan).unwrap(),
            &json!({ "error": "upstream rejected credentials" })
        );
        assert_eq!(
            results.get(ProviderName::Hibp).unwrap(),
            &json!({ "error": "timed out after 100ms" })
        );
        assert_eq!(
            results.get(ProviderName::Otx).unwrap(),
            &json!({ "error": "lookup aborted: stub exploded" })
        );
        assert_eq!(results.get(ProviderName::Urlhaus).unwrap()["query"], "example.com");
    }

    #[tokio::test]
    async fn test_all_failing_still_has_every_key() {
        let agg = aggregator(|_| Behavior::Fail);
        let results = agg.lookup_all("x").await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.error_count(), 10);
    }

    #[tokio::test]
    async fn test_unregistered_provider_keeps_placeholder() {
        let only_vt: Arc<dyn ThreatIntelProvider> = Arc::new(StubProvider {
            name: ProviderName::Virustotal,
            behavior: Behavior::Echo,
        });
        let agg = Aggregator::new(ProviderRegistry::new(vec![only_vt]), Duration::from_millis(100));
        let results = agg.lookup_all("q").await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.error_count(), 9);
        assert_eq!(results.get(ProviderName::Greynoise).unwrap()["error"], PENDING_MARKER);

        assert!(agg.lookup_one(ProviderName::Greynoise, "q").await.is_none());
        assert_eq!(agg.lookup_one(ProviderName::Virustotal, "q").await.unwrap()["query"], "q");
    }

    #[test]
    fn test_serializes_with_provider_keys() {
        let value = serde_json::to_value(AggregateResponse::pending()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 10);
        assert!(obj.contains_key("mx_toolbox"));
        assert!(obj.contains_key("whois_dns"));
    }

    #[test]
    fn test_error_marker_detection() {
        assert!(is_error_marker(&json!({ "error": "x" })));
        assert!(!is_error_marker(&json!({ "error": "x", "data": 1 })));
        assert!(!is_error_marker(&json!([])));
    }
}
