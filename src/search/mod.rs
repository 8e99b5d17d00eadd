pub mod youtube;

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;

use crate::{
    db::RatingStore,
    errors::AppError,
    models::{RatingSummary, SearchResult},
    ratings::rating_summary,
};

pub use youtube::YouTubeSearchClient;

pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const MAX_RESULTS_CAP: u32 = 50;

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, AppError>;
}

pub fn max_results(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .map(|n| n.clamp(1, MAX_RESULTS_CAP))
        .unwrap_or(DEFAULT_MAX_RESULTS)
}

pub async fn enrich_results(
    store: &dyn RatingStore,
    mut results: Vec<SearchResult>,
) -> Vec<SearchResult> {
    let mut ids: Vec<&str> = results.iter().map(|r| r.channel_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();

    let lookups = ids.into_iter().map(|channel_id| async move {
        match store.query_all_by_creator(channel_id, None).await {
            Ok(records) => rating_summary(&records).map(|s| (channel_id.to_string(), s)),
            Err(e) => {
                tracing::warn!("Rating lookup failed for search result {}: {}", channel_id, e);
                None
            }
        }
    });

    let summaries: HashMap<String, RatingSummary> =
        join_all(lookups).await.into_iter().flatten().collect();

    for result in &mut results {
        if let Some(summary) = summaries.get(&result.channel_id) {
            result.rating = Some(*summary);
        }
    }

    results
}
