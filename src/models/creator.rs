use serde::{Deserialize, Serialize};

use crate::models::rating::ProfileImages;

/// Derived on read from every rating a creator has; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSummary {
    pub channel_id: String,
    pub display_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub profile_images: Option<ProfileImages>,
    pub average_score: f64,
    pub rating_count: u64,
}

impl CreatorSummary {
    pub fn unrated(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            display_name: None,
            thumbnail_url: None,
            description: None,
            profile_images: None,
            average_score: 0.0,
            rating_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_score: f64,
    pub rating_count: u64,
}
