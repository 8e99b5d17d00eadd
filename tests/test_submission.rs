use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use creator_ratings_be::{
    db::{Cursor, MemoryRatingStore, Page, QueryOptions, RatingStore},
    errors::AppError,
    models::RatingRecord,
    ratings::{EmailPolicy, RatingSubmission, submit_rating},
};
use serde_json::json;

fn at(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, second).unwrap()
}

fn submission(body: serde_json::Value) -> RatingSubmission {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_valid_submission_without_email_is_stored() {
    let store = MemoryRatingStore::new();
    let policy = EmailPolicy::default();

    let record = submit_rating(
        &store,
        &policy,
        submission(json!({"channelId": "UC1", "rating": 4, "comment": " great "})),
        "203.0.113.7",
        at(0),
    )
    .await
    .unwrap();

    assert_eq!(record.creator_id, "UC1");
    assert_eq!(record.score, 4);
    assert_eq!(record.comment, "great");
    assert_eq!(record.submitted_at, "2024-06-01T12:00:00.000Z");
    assert_eq!(record.submitter_ip, "203.0.113.7");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_invalid_scores_never_write() {
    let store = MemoryRatingStore::new();
    let policy = EmailPolicy::default();

    for score in [json!(0), json!(6), json!(3.5), json!("five"), json!(null)] {
        let err = submit_rating(
            &store,
            &policy,
            submission(json!({"channelId": "UC1", "score": score})),
            "unknown",
            at(0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_missing_identifier_is_checked_first() {
    let store = MemoryRatingStore::new();
    let err = submit_rating(
        &store,
        &EmailPolicy::default(),
        submission(json!({"channelId": "  ", "score": 9})),
        "unknown",
        at(0),
    )
    .await
    .unwrap_err();

    match err {
        AppError::BadRequest(msg) => assert!(msg.contains("channelId")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_control_characters_in_channel_id_never_write() {
    let store = MemoryRatingStore::new();
    let policy = EmailPolicy::default();

    for channel_id in ["UC\tabc", "UC\u{1}abc", "UC\nabc", "UC\u{7f}"] {
        let err = submit_rating(
            &store,
            &policy,
            submission(json!({"channelId": channel_id, "score": 4})),
            "203.0.113.7",
            at(0),
        )
        .await
        .unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Invalid channelId"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_rejected_email_never_writes() {
    let store = MemoryRatingStore::new();
    let policy = EmailPolicy::default();

    for email in ["bad-address", "a@mailinator.com", "a@example.org", "a@corp.unknown"] {
        let err = submit_rating(
            &store,
            &policy,
            submission(json!({"channelId": "UC1", "score": 5, "email": email})),
            "unknown",
            at(0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{email}");
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_same_email_rates_once() {
    let store = MemoryRatingStore::new();
    let policy = EmailPolicy::default();
    let body = json!({"channelId": "UC1", "score": 5, "submitterEmail": "fan@gmail.com"});

    submit_rating(&store, &policy, submission(body.clone()), "unknown", at(0))
        .await
        .unwrap();

    let err = submit_rating(&store, &policy, submission(body), "unknown", at(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Case differences are the same identity.
    let err = submit_rating(
        &store,
        &policy,
        submission(json!({"channelId": "UC1", "score": 2, "email": "FAN@gmail.com"})),
        "unknown",
        at(2),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Another creator is fine.
    submit_rating(
        &store,
        &policy,
        submission(json!({"channelId": "UC2", "score": 5, "email": "fan@gmail.com"})),
        "unknown",
        at(3),
    )
    .await
    .unwrap();
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_third_submission_from_same_ip_is_rate_limited() {
    let store = MemoryRatingStore::new();
    let policy = EmailPolicy::default();
    let body = json!({"channelId": "UC1", "score": 3});

    for second in 0..2 {
        submit_rating(&store, &policy, submission(body.clone()), "198.51.100.1", at(second))
            .await
            .unwrap();
    }

    let err = submit_rating(&store, &policy, submission(body.clone()), "198.51.100.1", at(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RateLimited(_)));

    // A different address and an unknown address are not limited.
    submit_rating(&store, &policy, submission(body.clone()), "198.51.100.2", at(3))
        .await
        .unwrap();
    submit_rating(&store, &policy, submission(body), "unknown", at(4))
        .await
        .unwrap();
    assert_eq!(store.len().await, 4);
}

#[tokio::test]
async fn test_profile_images_and_descriptive_fields_are_kept() {
    let store = MemoryRatingStore::new();
    let record = submit_rating(
        &store,
        &EmailPolicy::default(),
        submission(json!({
            "channelId": "UC1",
            "score": 5,
            "channelName": "Chef Channel",
            "thumbnailUrl": "https://img/t.jpg",
            "description": "Food",
            "profileImages": "https://img/p.jpg"
        })),
        "unknown",
        at(0),
    )
    .await
    .unwrap();

    assert_eq!(record.creator_display_name.as_deref(), Some("Chef Channel"));
    assert_eq!(record.description.as_deref(), Some("Food"));
    let images = record.profile_images.unwrap();
    assert_eq!(images.get("default").map(String::as_str), Some("https://img/p.jpg"));
}

/// Reads always fail; writes go to an inner store.
struct FailingReads(MemoryRatingStore);

#[async_trait]
impl RatingStore for FailingReads {
    async fn query_by_creator(
        &self,
        _creator_id: &str,
        _options: QueryOptions,
    ) -> Result<Page, AppError> {
        Err(AppError::DatabaseError("read timeout".into()))
    }

    async fn scan_all(&self, _limit: usize, _cursor: Option<Cursor>) -> Result<Page, AppError> {
        Err(AppError::DatabaseError("read timeout".into()))
    }

    async fn put(&self, record: &RatingRecord) -> Result<(), AppError> {
        self.0.put(record).await
    }
}

#[tokio::test]
async fn test_failed_guard_lookups_do_not_block() {
    let store = FailingReads(MemoryRatingStore::new());

    submit_rating(
        &store,
        &EmailPolicy::default(),
        submission(json!({"channelId": "UC1", "score": 4, "email": "a@gmail.com"})),
        "192.0.2.9",
        at(0),
    )
    .await
    .unwrap();

    assert_eq!(store.0.len().await, 1);
}
