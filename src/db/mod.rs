pub mod cursor;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

use crate::{errors::AppError, models::RatingRecord};

pub use cursor::Cursor;
pub use memory::MemoryRatingStore;
pub use redis_store::RedisRatingStore;

pub const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    SubmitterEmail(String),
    SubmitterIp(String),
}

impl RecordFilter {
    pub fn matches(&self, record: &RatingRecord) -> bool {
        match self {
            RecordFilter::SubmitterEmail(email) => {
                record.submitter_email.as_deref() == Some(email.as_str())
            }
            RecordFilter::SubmitterIp(ip) => record.submitter_ip == *ip,
        }
    }
}

fn passes(filter: &Option<RecordFilter>, record: &RatingRecord) -> bool {
    filter.as_ref().is_none_or(|f| f.matches(record))
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    // Maximum number of matching records to return.
    pub limit: Option<usize>,
    pub cursor: Option<Cursor>,
    pub filter: Option<RecordFilter>,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<RatingRecord>,
    pub next_cursor: Option<Cursor>,
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Ratings for one creator, newest first.
    async fn query_by_creator(
        &self,
        creator_id: &str,
        options: QueryOptions,
    ) -> Result<Page, AppError>;

    async fn scan_all(&self, limit: usize, cursor: Option<Cursor>) -> Result<Page, AppError>;

    async fn put(&self, record: &RatingRecord) -> Result<(), AppError>;

    async fn query_all_by_creator(
        &self,
        creator_id: &str,
        filter: Option<RecordFilter>,
    ) -> Result<Vec<RatingRecord>, AppError> {
        let mut records = Vec::new();
        let mut cursor = None;

        loop {
            let page = self
                .query_by_creator(
                    creator_id,
                    QueryOptions {
                        limit: Some(DEFAULT_QUERY_LIMIT),
                        cursor,
                        filter: filter.clone(),
                    },
                )
                .await?;
            records.extend(page.records);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}
