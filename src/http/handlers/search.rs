use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    errors::{AppError, ErrorResponse},
    models::SearchResult,
    search::{enrich_results, max_results},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub max_results: Option<String>,
}

pub async fn search_handler(
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SearchResult>>, ErrorResponse> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing search query 'q'".into()).to_response())?;
    let max_results = max_results(query.max_results.as_deref());

    let client = state.search.as_ref().ok_or_else(|| {
        tracing::error!("Search requested but no search API key is configured");
        AppError::Configuration("Search is not configured".into()).to_response()
    })?;

    let results = client.search_channels(q, max_results).await.map_err(|e| {
        tracing::error!("Search for '{}' failed: {}", q, e);
        e.to_response()
    })?;

    let results = enrich_results(state.store.as_ref(), results).await;

    tracing::info!("Search for '{}' returned {} channels", q, results.len());
    Ok(Json(results))
}
