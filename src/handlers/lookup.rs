//! Lookup handlers

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::aggregate::AggregateResponse;
use crate::providers::ProviderName;
use crate::{AppError, AppResult, AppState};

const MISSING_QUERY: &str = "Missing or empty 'query' parameter";

#[derive(Debug, Deserialize, Validate)]
pub struct LookupParams {
    #[validate(required, length(min = 1, max = 2048))]
    pub query: Option<String>,
}

impl LookupParams {
    /// Validated, trimmed query term
    pub fn into_query(self) -> AppResult<String> {
        self.validate()
            .map_err(|_| AppError::ValidationError(MISSING_QUERY.to_string()))?;

        let query = self.query.unwrap_or_default().trim().to_string();
        if query.is_empty() {
            return Err(AppError::ValidationError(MISSING_QUERY.to_string()));
        }

        Ok(query)
    }
}

#[derive(Debug, Serialize)]
pub struct SingleLookupResponse {
    pub provider: ProviderName,
    pub query: String,
    pub result: Value,
}

/// Fan a query out to every provider
pub async fn lookup(
    State(state): State<AppState>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> AppResult<Json<AggregateResponse>> {
    let Query(params) = params?;
    let query = params.into_query()?;

    let results = state.aggregator.lookup_all(&query).await;
    Ok(Json(results))
}

/// Query a single provider by name
pub async fn lookup_provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> AppResult<Json<SingleLookupResponse>> {
    let name: ProviderName = provider.parse().map_err(AppError::NotFound)?;

    let Query(params) = params?;
    let query = params.into_query()?;

    let result = state.aggregator
        .lookup_one(name, &query)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Provider '{}' is not registered", name)))?;

    Ok(Json(SingleLookupResponse {
        provider: name,
        query,
        result,
    }))
}
