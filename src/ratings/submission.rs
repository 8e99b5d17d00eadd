use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    db::{QueryOptions, RatingStore, RecordFilter},
    errors::AppError,
    models::{ProfileImages, RatingRecord, UNKNOWN_IP},
    ratings::email_policy::EmailPolicy,
};

// Most ratings one IP address may leave on one creator.
pub const MAX_RATINGS_PER_IP: usize = 2;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    #[serde(alias = "creatorId")]
    pub channel_id: Option<String>,
    // Raw JSON so a non-integer score is an "invalid score", not a body
    // parse failure.
    #[serde(alias = "rating")]
    pub score: Option<Value>,
    pub comment: Option<String>,
    #[serde(alias = "channelName", alias = "creatorDisplayName")]
    pub display_name: Option<String>,
    #[serde(alias = "email")]
    pub submitter_email: Option<String>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub profile_images: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub creator_id: String,
    pub score: i64,
    pub submitter_email: Option<String>,
    pub comment: String,
    pub display_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub profile_images: Option<ProfileImages>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_score(value: Option<&Value>) -> Option<i64> {
    let score = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (MIN_SCORE..=MAX_SCORE).contains(&score).then_some(score)
}

pub fn normalize_profile_images(value: Option<Value>) -> Option<ProfileImages> {
    match value? {
        Value::String(url) => {
            let url = url.trim().to_string();
            (!url.is_empty()).then(|| ProfileImages::from([("default".to_string(), url)]))
        }
        Value::Object(map) => {
            let images: ProfileImages = map
                .into_iter()
                .filter_map(|(size, url)| match url {
                    Value::String(url) if !url.trim().is_empty() => Some((size, url)),
                    _ => None,
                })
                .collect();
            (!images.is_empty()).then_some(images)
        }
        _ => None,
    }
}

pub fn validate_submission(
    policy: &EmailPolicy,
    submission: RatingSubmission,
) -> Result<ValidatedSubmission, AppError> {
    let creator_id = clean(submission.channel_id)
        .ok_or_else(|| AppError::BadRequest("Missing channelId".into()))?;
    // Control characters would corrupt the tab-joined index members.
    if creator_id.chars().any(char::is_control) {
        return Err(AppError::BadRequest("Invalid channelId".into()));
    }

    let score = parse_score(submission.score.as_ref()).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid score: must be an integer between {MIN_SCORE} and {MAX_SCORE}"
        ))
    })?;

    let submitter_email = match clean(submission.submitter_email) {
        Some(email) => {
            policy
                .classify(&email)
                .map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;
            Some(email.to_lowercase())
        }
        None => None,
    };

    Ok(ValidatedSubmission {
        creator_id,
        score,
        submitter_email,
        comment: submission.comment.map(|c| c.trim().to_string()).unwrap_or_default(),
        display_name: clean(submission.display_name),
        thumbnail_url: clean(submission.thumbnail_url),
        description: clean(submission.description),
        profile_images: normalize_profile_images(submission.profile_images),
    })
}

fn ip_is_known(ip: &str) -> bool {
    !ip.is_empty() && ip != UNKNOWN_IP
}

/// Both guards are check-then-act: two concurrent submissions can pass them
/// before either write lands. A guard whose lookup fails lets the
/// submission through.
pub async fn submit_rating(
    store: &dyn RatingStore,
    policy: &EmailPolicy,
    submission: RatingSubmission,
    source_ip: &str,
    now: DateTime<Utc>,
) -> Result<RatingRecord, AppError> {
    let valid = validate_submission(policy, submission)?;

    if let Some(email) = &valid.submitter_email {
        let lookup = store
            .query_by_creator(
                &valid.creator_id,
                QueryOptions {
                    limit: Some(1),
                    cursor: None,
                    filter: Some(RecordFilter::SubmitterEmail(email.clone())),
                },
            )
            .await;

        match lookup {
            Ok(page) if !page.records.is_empty() => {
                tracing::info!(
                    "Duplicate rating for {} from {} rejected",
                    valid.creator_id,
                    email
                );
                return Err(AppError::Conflict(
                    "You have already rated this creator".into(),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "Duplicate check failed for {}, continuing: {}",
                    valid.creator_id,
                    e
                );
            }
        }
    }

    if ip_is_known(source_ip) {
        let lookup = store
            .query_by_creator(
                &valid.creator_id,
                QueryOptions {
                    limit: Some(MAX_RATINGS_PER_IP),
                    cursor: None,
                    filter: Some(RecordFilter::SubmitterIp(source_ip.to_string())),
                },
            )
            .await;

        match lookup {
            Ok(page) if page.records.len() >= MAX_RATINGS_PER_IP => {
                tracing::warn!(
                    "Rating limit reached for {} from {}",
                    valid.creator_id,
                    source_ip
                );
                return Err(AppError::RateLimited(
                    "Rating limit reached for this creator".into(),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "Rate limit check failed for {} from {}, continuing: {}",
                    valid.creator_id,
                    source_ip,
                    e
                );
            }
        }
    }

    let record = RatingRecord {
        creator_id: valid.creator_id,
        submitted_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        score: valid.score,
        comment: valid.comment,
        submitter_email: valid.submitter_email,
        submitter_ip: if ip_is_known(source_ip) {
            source_ip.to_string()
        } else {
            UNKNOWN_IP.to_string()
        },
        creator_display_name: valid.display_name,
        thumbnail_url: valid.thumbnail_url,
        description: valid.description,
        profile_images: valid.profile_images,
    };

    store.put(&record).await.map_err(|e| {
        tracing::error!(
            "Failed to store rating for {} at {}: {}",
            record.creator_id,
            record.submitted_at,
            e
        );
        e
    })?;

    tracing::info!(
        "Stored rating {} for {} at {}",
        record.score,
        record.creator_id,
        record.submitted_at
    );

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scores_must_be_integers_in_range() {
        assert_eq!(parse_score(Some(&json!(1))), Some(1));
        assert_eq!(parse_score(Some(&json!(5))), Some(5));
        assert_eq!(parse_score(Some(&json!("4"))), Some(4));
        assert_eq!(parse_score(Some(&json!(0))), None);
        assert_eq!(parse_score(Some(&json!(6))), None);
        assert_eq!(parse_score(Some(&json!(4.5))), None);
        assert_eq!(parse_score(Some(&json!(true))), None);
        assert_eq!(parse_score(None), None);
    }

    #[test]
    fn bare_image_url_becomes_default() {
        let images = normalize_profile_images(Some(json!("https://img/a.jpg"))).unwrap();
        assert_eq!(images.get("default").map(String::as_str), Some("https://img/a.jpg"));

        let images =
            normalize_profile_images(Some(json!({"high": "https://img/h.jpg", "bad": 3})))
                .unwrap();
        assert_eq!(images.len(), 1);

        assert!(normalize_profile_images(Some(json!(42))).is_none());
        assert!(normalize_profile_images(Some(json!({}))).is_none());
    }
}
