//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::providers::ProviderName;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    timestamp: i64,
    providers: Vec<ProviderStatus>,
}

#[derive(Serialize)]
pub struct ProviderStatus {
    name: ProviderName,
    configured: bool,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.aggregator.registry();
    let providers = ProviderName::ALL
        .into_iter()
        .map(|name| ProviderStatus {
            name,
            configured: registry.get(name).map_or(false, |p| p.is_configured()),
        })
        .collect();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().timestamp(),
        providers,
    })
}
