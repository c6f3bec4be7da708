//! CTI Lookup Server
//!
//! Aggregates OSINT threat-intelligence lookups for a single query term.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CTI LOOKUP SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐      ┌───────────────┐                       │
//! │  │  API      │      │  Aggregator   │   ┌───────────────┐   │
//! │  │  Gateway  │─────▶│  (fan-out,    │──▶│ Provider      │   │
//! │  │  (Axum)   │      │   timeouts)   │   │ Registry (10) │   │
//! │  └───────────┘      └───────────────┘   └───────┬───────┘   │
//! │                                                 ▼           │
//! │                                   VirusTotal, AbuseIPDB,    │
//! │                                   OTX, Shodan, GreyNoise,   │
//! │                                   URLhaus, MalwareBazaar,   │
//! │                                   MxToolbox, RDAP/DNS, HIBP │
//! │                                                             │
//! │  /threats ──▶ ThreatFeeds ──▶ Spamhaus, AbuseIPDB, OTX,     │
//! │                               MalwareBazaar blocklists      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod feeds;
pub mod handlers;
pub mod indicator;
pub mod providers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use aggregate::Aggregator;
use config::Config;
use feeds::ThreatFeeds;
use providers::ProviderRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub feeds: Arc<ThreatFeeds>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, registry: ProviderRegistry, feeds: ThreatFeeds) -> Self {
        let aggregator = Aggregator::new(registry, config.provider_timeout);
        Self {
            aggregator: Arc::new(aggregator),
            feeds: Arc::new(feeds),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/lookup", get(handlers::lookup::lookup))
        .route("/lookup/:provider", get(handlers::lookup::lookup_provider))
        .route("/threats", get(handlers::threats::list))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
