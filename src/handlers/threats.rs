//! Threat feed handler

use axum::{extract::State, Json};

use crate::feeds::ThreatFeedResponse;
use crate::AppState;

/// Merge the public IP, domain and hash feeds
pub async fn list(State(state): State<AppState>) -> Json<ThreatFeedResponse> {
    Json(state.feeds.fetch_all().await)
}
