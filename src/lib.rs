pub mod config;
pub mod db;
pub mod errors;
pub mod http;
pub mod middleware;
pub mod models;
pub mod ratings;
pub mod search;
pub mod state;

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::{
    config::{Config, StoreBackend},
    db::{MemoryRatingStore, RatingStore, RedisRatingStore},
    errors::AppError,
    middleware::cors_layer,
    search::{SearchClient, YouTubeSearchClient},
    state::AppState,
};

pub fn create_app(state: AppState) -> Router {
    http::create_http_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

pub async fn build_state(config: Config) -> Result<AppState, AppError> {
    let store: Arc<dyn RatingStore> = match config.store_backend {
        StoreBackend::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| AppError::EnvError("REDIS_URL must be set".into()))?;
            Arc::new(RedisRatingStore::connect(redis_url, &config.table_name).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory rating store, ratings are lost on restart");
            Arc::new(MemoryRatingStore::new())
        }
    };

    let search: Option<Arc<dyn SearchClient>> = match config.youtube_api_key.as_deref() {
        Some(key) => Some(Arc::new(YouTubeSearchClient::new(key)?)),
        None => None,
    };

    Ok(AppState::new(store, search, config))
}

pub async fn start_server() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let port = config.port;
    tracing::info!(
        "Starting creator ratings API (stage {}, region {}, table {})",
        config.stage,
        config.region,
        config.table_name
    );

    let state = build_state(config).await?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("Creator ratings API listening on port {}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
