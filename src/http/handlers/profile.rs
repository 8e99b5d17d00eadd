use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{Cursor, QueryOptions},
    errors::ErrorResponse,
    http::handlers::required_channel_id,
    models::{CreatorSummary, RatingComment},
    ratings::summarize,
    state::AppState,
};

pub const DEFAULT_PROFILE_LIMIT: usize = 20;
pub const MAX_PROFILE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(rename = "channelId", alias = "creatorId")]
    pub channel_id: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRatings {
    pub items: Vec<RatingComment>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub channel_info: CreatorSummary,
    pub ratings: ProfileRatings,
}

fn profile_limit(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, MAX_PROFILE_LIMIT as i64) as usize)
        .unwrap_or(DEFAULT_PROFILE_LIMIT)
}

pub async fn get_profile_handler(
    Query(query): Query<ProfileQuery>,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ErrorResponse> {
    let channel_id =
        required_channel_id(query.channel_id.as_deref()).map_err(|e| e.to_response())?;
    let limit = profile_limit(query.limit.as_deref());

    let all = state
        .store
        .query_all_by_creator(&channel_id, None)
        .await
        .map_err(|e| {
            tracing::error!("Error loading profile for {}: {}", channel_id, e);
            e.to_response()
        })?;

    let channel_info = summarize(&all)
        .into_iter()
        .next()
        .unwrap_or_else(|| CreatorSummary::unrated(channel_id.clone()));

    let page = state
        .store
        .query_by_creator(
            &channel_id,
            QueryOptions {
                limit: Some(limit),
                cursor: Cursor::from_token(query.cursor),
                filter: None,
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(
                "Error paging ratings for {} (limit {}): {}",
                channel_id,
                limit,
                e
            );
            e.to_response()
        })?;

    let items: Vec<RatingComment> = page.records.iter().map(RatingComment::from).collect();

    Ok(Json(ProfileResponse {
        channel_info,
        ratings: ProfileRatings {
            count: items.len(),
            items,
            next_cursor: page.next_cursor,
        },
    }))
}
