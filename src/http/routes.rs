use axum::{
    Json, Router,
    http::StatusCode,
    routing::get,
};

use crate::{
    errors::{ErrorBody, ErrorResponse},
    http::handlers::{
        get_profile_handler, get_ratings_handler, get_recent_ratings_handler,
        get_top_creators_handler, health_handler, search_handler, submit_rating_handler,
    },
    state::AppState,
};

// Bare OPTIONS requests without CORS preflight headers still get a 200.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".into(),
        }),
    )
}

pub fn create_http_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler).options(preflight))
        .route(
            "/ratings",
            get(get_ratings_handler)
                .post(submit_rating_handler)
                .options(preflight),
        )
        .route("/profile", get(get_profile_handler).options(preflight))
        .route(
            "/top-creators",
            get(get_top_creators_handler).options(preflight),
        )
        .route(
            "/recent-ratings",
            get(get_recent_ratings_handler).options(preflight),
        )
        .fallback(not_found)
        .with_state(state)
}
