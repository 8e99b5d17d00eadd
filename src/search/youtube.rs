use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::{errors::AppError, models::SearchResult, search::SearchClient};

pub const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

pub struct YouTubeSearchClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl YouTubeSearchClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        Self::with_endpoint(api_key, YOUTUBE_SEARCH_URL)
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }
}

impl SearchItem {
    fn into_result(self) -> Option<SearchResult> {
        let channel_id = self.id.channel_id?;
        let snippet = self.snippet.unwrap_or(Snippet {
            title: String::new(),
            description: String::new(),
            published_at: None,
            thumbnails: None,
        });
        let thumbnail_url = snippet
            .thumbnails
            .and_then(|t| t.high.or(t.medium).or(t.default))
            .map(|t| t.url);

        Some(SearchResult {
            channel_id,
            title: snippet.title,
            description: snippet.description,
            thumbnail_url,
            published_at: snippet.published_at,
            rating: None,
        })
    }
}

#[async_trait]
impl SearchClient for YouTubeSearchClient {
    async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, AppError> {
        let max_results = max_results.to_string();

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet"),
                ("type", "channel"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("YouTube search request failed for '{}': {}", query, e);
                AppError::Upstream {
                    status: e.status().map(|s| s.as_u16()),
                    message: "Search request failed".into(),
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            let envelope = res.json::<ApiErrorEnvelope>().await.ok();
            let (code, message) = match envelope {
                Some(ApiErrorEnvelope { error }) => (error.code, error.message),
                None => (None, None),
            };
            tracing::error!(
                "YouTube search for '{}' returned {}: {:?}",
                query,
                status,
                message
            );
            return Err(AppError::Upstream {
                status: code.or(Some(status.as_u16())),
                message: message.unwrap_or_else(|| format!("Search API error: {status}")),
            });
        }

        let body: SearchApiResponse = res.json().await.map_err(|e| {
            tracing::error!("Invalid JSON from YouTube search for '{}': {}", query, e);
            AppError::Upstream {
                status: None,
                message: "Invalid response from search API".into(),
            }
        })?;

        Ok(body
            .items
            .into_iter()
            .filter_map(SearchItem::into_result)
            .collect())
    }
}
