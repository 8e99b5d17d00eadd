use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    db::Cursor,
    errors::{AppError, ErrorResponse},
    models::{CreatorSummary, PublicRating},
    ratings::aggregate::{self, recent_ratings, top_creators},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCreatorsQuery {
    pub limit: Option<String>,
    pub cursor: Option<String>,
    pub min_ratings: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCreatorsResponse {
    pub creators: Vec<CreatorSummary>,
    pub total: usize,
    pub count: usize,
    pub min_ratings: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Deserialize)]
pub struct RecentRatingsQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecentRatingsResponse {
    pub count: usize,
    pub ratings: Vec<PublicRating>,
}

/// Ranks the creators found in one scan page. `nextCursor` continues the
/// scan; the ranking is not global across pages.
pub async fn get_top_creators_handler(
    Query(query): Query<TopCreatorsQuery>,
    State(state): State<AppState>,
) -> Result<Json<TopCreatorsResponse>, ErrorResponse> {
    let limit = aggregate::top_limit(query.limit.as_deref());
    let min_ratings = aggregate::min_ratings(query.min_ratings.as_deref());

    let page = state
        .store
        .scan_all(state.config.scan_page_size, Cursor::from_token(query.cursor))
        .await
        .map_err(|e| {
            tracing::error!(
                "Error scanning ratings for top creators (limit {}, minRatings {}): {}",
                limit,
                min_ratings,
                e
            );
            e.to_response()
        })?;

    let top = top_creators(&page.records, min_ratings, limit);

    tracing::info!(
        "Ranked {} creators from {} ratings",
        top.total,
        page.records.len()
    );

    Ok(Json(TopCreatorsResponse {
        count: top.creators.len(),
        total: top.total,
        creators: top.creators,
        min_ratings,
        next_cursor: page.next_cursor,
    }))
}

pub async fn get_recent_ratings_handler(
    Query(query): Query<RecentRatingsQuery>,
    State(state): State<AppState>,
) -> Result<Json<RecentRatingsResponse>, ErrorResponse> {
    let count = aggregate::recent_count(query.limit.as_deref());

    let page = state
        .store
        .scan_all(state.config.scan_page_size.max(count), None)
        .await
        .map_err(|e| {
            tracing::error!("Error scanning recent ratings (limit {}): {}", count, e);
            e.to_response()
        })?;

    if page.records.is_empty() {
        return Err(AppError::NotFound("No ratings found".into()).to_response());
    }

    let ratings: Vec<PublicRating> = recent_ratings(page.records, count)
        .into_iter()
        .map(PublicRating::from)
        .collect();

    Ok(Json(RecentRatingsResponse {
        count: ratings.len(),
        ratings,
    }))
}
