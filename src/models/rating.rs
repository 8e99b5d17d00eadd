use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size name (`default`, `medium`, `high`, ...) to image URL.
pub type ProfileImages = BTreeMap<String, String>;

pub const UNKNOWN_IP: &str = "unknown";

/// The only persisted entity. Written once at submission, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub creator_id: String,
    pub submitted_at: String,
    pub score: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_email: Option<String>,
    #[serde(default = "unknown_ip")]
    pub submitter_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_images: Option<ProfileImages>,
}

fn unknown_ip() -> String {
    UNKNOWN_IP.to_string()
}

impl RatingRecord {
    pub fn new(creator_id: impl Into<String>, submitted_at: impl Into<String>, score: i64) -> Self {
        Self {
            creator_id: creator_id.into(),
            submitted_at: submitted_at.into(),
            score,
            comment: String::new(),
            submitter_email: None,
            submitter_ip: unknown_ip(),
            creator_display_name: None,
            thumbnail_url: None,
            description: None,
            profile_images: None,
        }
    }
}

/// A rating as shown under a creator: no submitter details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingComment {
    pub comment: String,
    pub score: i64,
    pub submitted_at: String,
}

impl From<&RatingRecord> for RatingComment {
    fn from(record: &RatingRecord) -> Self {
        Self {
            comment: record.comment.clone(),
            score: record.score,
            submitted_at: record.submitted_at.clone(),
        }
    }
}

/// A rating in the cross-creator feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRating {
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub score: i64,
    pub comment: String,
    pub submitted_at: String,
}

impl From<RatingRecord> for PublicRating {
    fn from(record: RatingRecord) -> Self {
        Self {
            channel_id: record.creator_id,
            channel_name: record.creator_display_name,
            thumbnail_url: record.thumbnail_url,
            score: record.score,
            comment: record.comment,
            submitted_at: record.submitted_at,
        }
    }
}
