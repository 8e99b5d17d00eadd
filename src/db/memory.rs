use async_trait::async_trait;
use std::{collections::BTreeMap, ops::Bound};
use tokio::sync::RwLock;

use crate::{
    db::{
        DEFAULT_QUERY_LIMIT, Page, QueryOptions, RatingStore, passes,
        cursor::{Cursor, StoreKey},
    },
    errors::AppError,
    models::RatingRecord,
};

type Key = (String, String);

#[derive(Debug, Default)]
pub struct MemoryRatingStore {
    records: RwLock<BTreeMap<Key, RatingRecord>>,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn cursor_for(record: &RatingRecord) -> Result<Cursor, AppError> {
    Cursor::encode(&StoreKey {
        creator_id: record.creator_id.clone(),
        submitted_at: record.submitted_at.clone(),
    })
}

#[async_trait]
impl RatingStore for MemoryRatingStore {
    async fn query_by_creator(
        &self,
        creator_id: &str,
        options: QueryOptions,
    ) -> Result<Page, AppError> {
        let limit = options.limit.unwrap_or(DEFAULT_QUERY_LIMIT).max(1);

        // Everything keyed (creator_id, _) sorts below (creator_id + "\0", "").
        let upper = match &options.cursor {
            Some(cursor) => {
                let key = cursor.decode()?;
                if key.creator_id != creator_id {
                    return Err(AppError::BadRequest("Invalid cursor".into()));
                }
                Bound::Excluded((key.creator_id, key.submitted_at))
            }
            None => Bound::Excluded((format!("{creator_id}\0"), String::new())),
        };
        let lower = Bound::Included((creator_id.to_string(), String::new()));

        let records = self.records.read().await;
        let mut page = Page::default();

        for record in records.range((lower, upper)).rev().map(|(_, r)| r) {
            if !passes(&options.filter, record) {
                continue;
            }
            if page.records.len() == limit {
                page.next_cursor = page.records.last().map(cursor_for).transpose()?;
                break;
            }
            page.records.push(record.clone());
        }

        Ok(page)
    }

    async fn scan_all(&self, limit: usize, cursor: Option<Cursor>) -> Result<Page, AppError> {
        let limit = limit.max(1);
        let lower = match cursor {
            Some(cursor) => {
                let key = cursor.decode()?;
                Bound::Excluded((key.creator_id, key.submitted_at))
            }
            None => Bound::Unbounded,
        };

        let records = self.records.read().await;
        let mut page = Page::default();

        for record in records.range((lower, Bound::Unbounded)).map(|(_, r)| r) {
            if page.records.len() == limit {
                page.next_cursor = page.records.last().map(cursor_for).transpose()?;
                break;
            }
            page.records.push(record.clone());
        }

        Ok(page)
    }

    async fn put(&self, record: &RatingRecord) -> Result<(), AppError> {
        self.records.write().await.insert(
            (record.creator_id.clone(), record.submitted_at.clone()),
            record.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RecordFilter;
    use std::collections::HashSet;

    fn record(creator: &str, minute: u32, score: i64) -> RatingRecord {
        RatingRecord::new(creator, format!("2024-01-01T10:{minute:02}:00.000Z"), score)
    }

    async fn seeded() -> MemoryRatingStore {
        let store = MemoryRatingStore::new();
        for minute in 0..7 {
            store.put(&record("UCa", minute, 5)).await.unwrap();
        }
        store.put(&record("UCab", 1, 1)).await.unwrap();
        store.put(&record("UC0", 1, 3)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn creator_pages_are_newest_first_without_overlap() {
        let store = seeded().await;
        let mut seen = Vec::new();
        let mut cursor = None;

        loop {
            let page = store
                .query_by_creator(
                    "UCa",
                    QueryOptions {
                        limit: Some(3),
                        cursor,
                        filter: None,
                    },
                )
                .await
                .unwrap();
            assert!(page.records.len() <= 3);
            seen.extend(page.records.into_iter().map(|r| r.submitted_at));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 7);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 7);
        let mut sorted = seen.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(seen, sorted);
    }

    #[tokio::test]
    async fn exact_fit_has_no_next_cursor() {
        let store = seeded().await;
        let page = store
            .query_by_creator(
                "UCa",
                QueryOptions {
                    limit: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.records.len(), 7);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn prefix_creator_ids_do_not_leak() {
        let store = seeded().await;
        let records = store.query_all_by_creator("UCa", None).await.unwrap();
        assert!(records.iter().all(|r| r.creator_id == "UCa"));
        assert_eq!(records.len(), 7);
    }

    #[tokio::test]
    async fn filter_counts_only_matches() {
        let store = MemoryRatingStore::new();
        for minute in 0..4 {
            let mut r = record("UCa", minute, 4);
            r.submitter_ip = if minute % 2 == 0 { "1.1.1.1" } else { "2.2.2.2" }.into();
            store.put(&r).await.unwrap();
        }
        let page = store
            .query_by_creator(
                "UCa",
                QueryOptions {
                    limit: Some(5),
                    cursor: None,
                    filter: Some(RecordFilter::SubmitterIp("1.1.1.1".into())),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn scan_visits_every_record_once() {
        let store = seeded().await;
        let mut seen = HashSet::new();
        let mut cursor = None;
        let mut pages = 0;

        loop {
            let page = store.scan_all(4, cursor).await.unwrap();
            pages += 1;
            for r in page.records {
                assert!(seen.insert((r.creator_id, r.submitted_at)));
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 9);
        assert_eq!(pages, 3);
    }

    #[tokio::test]
    async fn foreign_cursor_is_rejected() {
        let store = seeded().await;
        let first = store
            .query_by_creator(
                "UCa",
                QueryOptions {
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = store
            .query_by_creator(
                "UC0",
                QueryOptions {
                    limit: Some(1),
                    cursor: first.next_cursor,
                    filter: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
