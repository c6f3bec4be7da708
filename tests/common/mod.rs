#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cti_lookup::config::{Config, ProviderKeys};
use cti_lookup::error::ProviderError;
use cti_lookup::feeds::ThreatFeeds;
use cti_lookup::providers::{ProviderName, ProviderRegistry, ThreatIntelProvider};
use cti_lookup::{create_router, AppState};

#[derive(Clone, Copy)]
pub enum Behavior {
    Echo,
    Fail,
    Hang,
}

/// Provider double that records every query it sees
pub struct MockProvider {
    name: ProviderName,
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(name: ProviderName, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreatIntelProvider for MockProvider {
    fn name(&self) -> ProviderName {
        self.name
    }

    async fn lookup(&self, query: &str) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.to_string());

        match self.behavior {
            Behavior::Echo => Ok(json!({ "provider": self.name.as_str(), "query": query })),
            Behavior::Fail => Err(ProviderError::Network("connection refused".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(json!({}))
            }
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub providers: Vec<Arc<MockProvider>>,
}

impl TestApp {
    pub fn new(behavior_for: impl Fn(ProviderName) -> Behavior) -> Self {
        let providers: Vec<Arc<MockProvider>> = ProviderName::ALL
            .into_iter()
            .map(|name| MockProvider::new(name, behavior_for(name)))
            .collect();

        let registry = ProviderRegistry::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn ThreatIntelProvider>)
                .collect(),
        );

        Self {
            router: create_router(AppState::new(test_config(), registry, no_feeds())),
            providers,
        }
    }

    pub fn total_calls(&self) -> usize {
        self.providers.iter().map(|p| p.calls()).sum()
    }

    pub fn provider(&self, name: ProviderName) -> &Arc<MockProvider> {
        self.providers.iter().find(|p| p.name == name).unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        get_json(&self.router, uri).await
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        environment: "test".to_string(),
        provider_timeout: Duration::from_millis(200),
        keys: ProviderKeys::default(),
    }
}

fn no_feeds() -> ThreatFeeds {
    ThreatFeeds::new(reqwest::Client::new(), Vec::new(), Duration::from_millis(200))
}

/// Router with no providers and the given feed set
pub fn feeds_router(feeds: ThreatFeeds) -> Router {
    create_router(AppState::new(test_config(), ProviderRegistry::default(), feeds))
}

/// Issue a GET against `router` and decode the JSON body
pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Assert the body is an object with exactly the ten provider keys
pub fn assert_ten_keys(body: &Value) {
    let obj = body.as_object().expect("aggregate response must be an object");
    assert_eq!(obj.len(), 10);
    for name in ProviderName::ALL {
        assert!(obj.contains_key(name.as_str()), "missing key {}", name);
    }
}
