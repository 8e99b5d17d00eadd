use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{AppError, ErrorResponse},
    http::handlers::required_channel_id,
    middleware::ClientIp,
    models::RatingComment,
    ratings::{RatingSubmission, rating_summary, submit_rating},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    #[serde(rename = "channelId", alias = "creatorId")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRatings {
    pub channel_id: String,
    pub average_score: f64,
    pub rating_count: u64,
    pub comments: Vec<RatingComment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingResponse {
    pub message: String,
    pub submitted_at: String,
    pub channel_id: String,
}

pub async fn get_ratings_handler(
    Query(query): Query<ChannelQuery>,
    State(state): State<AppState>,
) -> Result<Json<ChannelRatings>, ErrorResponse> {
    let channel_id =
        required_channel_id(query.channel_id.as_deref()).map_err(|e| e.to_response())?;

    let records = state
        .store
        .query_all_by_creator(&channel_id, None)
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving ratings for {}: {}", channel_id, e);
            e.to_response()
        })?;

    let summary = rating_summary(&records).ok_or_else(|| {
        AppError::NotFound(format!("No ratings found for channel {channel_id}")).to_response()
    })?;

    tracing::info!("Retrieved {} ratings for {}", summary.rating_count, channel_id);

    Ok(Json(ChannelRatings {
        channel_id,
        average_score: summary.average_score,
        rating_count: summary.rating_count,
        comments: records.iter().map(RatingComment::from).collect(),
    }))
}

pub async fn submit_rating_handler(
    State(state): State<AppState>,
    ClientIp(source_ip): ClientIp,
    payload: Result<Json<RatingSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitRatingResponse>), ErrorResponse> {
    let Json(submission) = payload.map_err(|rejection| {
        tracing::warn!("Rejected rating body: {}", rejection);
        AppError::BadRequest("Invalid JSON body".into()).to_response()
    })?;

    let record = submit_rating(
        state.store.as_ref(),
        &state.email_policy,
        submission,
        &source_ip,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        match &e {
            AppError::BadRequest(_) | AppError::Conflict(_) | AppError::RateLimited(_) => {
                tracing::info!("Rating rejected: {}", e)
            }
            _ => tracing::error!("Error submitting rating: {}", e),
        }
        e.to_response()
    })?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRatingResponse {
            message: "Rating submitted successfully".into(),
            submitted_at: record.submitted_at,
            channel_id: record.creator_id,
        }),
    ))
}
