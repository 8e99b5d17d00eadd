use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;

use crate::{
    db::{
        DEFAULT_QUERY_LIMIT, Page, QueryOptions, RatingStore, passes,
        cursor::{Cursor, StoreKey},
    },
    errors::AppError,
    models::{RatingRecord, redis::RedisKey},
    state::RedisClient,
};

// Ratings stored in Redis under one namespace:
//
// * `{ns}:rating:{creator}:{submitted_at}` holds the JSON record.
// * `{ns}:creator:{creator}:ratings` is a sorted set of `submitted_at`
//   values, all scored 0 so members sort lexically (ISO-8601 sorts by time).
// * `{ns}:ratings:index` holds `creator\tsubmitted_at` for table-wide scans.
#[derive(Clone)]
pub struct RedisRatingStore {
    redis: RedisClient,
    namespace: String,
}

impl RedisRatingStore {
    pub fn new(redis: RedisClient, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    pub async fn connect(redis_url: &str, namespace: &str) -> Result<Self, AppError> {
        let manager = RedisConnectionManager::new(redis_url)?;
        let pool = Pool::builder().build(manager).await?;
        tracing::info!("Connected Redis pool for namespace {}", namespace);
        Ok(Self::new(pool, namespace))
    }

    async fn conn(&self) -> Result<PooledConnection<'_, RedisConnectionManager>, AppError> {
        self.redis.get().await.map_err(|e| match e {
            bb8::RunError::User(err) => AppError::RedisCommandError(err),
            bb8::RunError::TimedOut => {
                AppError::RedisPoolError("Redis connection timed out".into())
            }
        })
    }

    async fn load_records(
        &self,
        conn: &mut PooledConnection<'_, RedisConnectionManager>,
        keys: &[String],
    ) -> Result<Vec<RatingRecord>, AppError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut **conn)
            .await
            .map_err(AppError::RedisCommandError)?;

        let mut records = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            // Index entry without a body: the record was removed out of band.
            let Some(json) = value else {
                tracing::warn!("Rating index points at missing record {}", key);
                continue;
            };
            let record: RatingRecord = serde_json::from_str(&json).map_err(|e| {
                tracing::error!("Corrupt rating record at {}: {}", key, e);
                AppError::Deserialization(e.to_string())
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

fn cursor_for(record: &RatingRecord) -> Result<Cursor, AppError> {
    Cursor::encode(&StoreKey {
        creator_id: record.creator_id.clone(),
        submitted_at: record.submitted_at.clone(),
    })
}

#[async_trait]
impl RatingStore for RedisRatingStore {
    async fn query_by_creator(
        &self,
        creator_id: &str,
        options: QueryOptions,
    ) -> Result<Page, AppError> {
        let limit = options.limit.unwrap_or(DEFAULT_QUERY_LIMIT).max(1);
        let set_key = RedisKey::creator_ratings(&self.namespace, creator_id);

        let mut max = match &options.cursor {
            Some(cursor) => {
                let key = cursor.decode()?;
                if key.creator_id != creator_id {
                    return Err(AppError::BadRequest("Invalid cursor".into()));
                }
                format!("({}", key.submitted_at)
            }
            None => "+".to_string(),
        };

        let mut conn = self.conn().await?;
        let mut page = Page::default();
        let batch = limit + 1;

        'scan: loop {
            let members: Vec<String> = redis::cmd("ZREVRANGEBYLEX")
                .arg(&set_key)
                .arg(&max)
                .arg("-")
                .arg("LIMIT")
                .arg(0)
                .arg(batch)
                .query_async(&mut *conn)
                .await
                .map_err(AppError::RedisCommandError)?;

            let Some(last) = members.last() else {
                break;
            };
            max = format!("({last}");

            let keys: Vec<String> = members
                .iter()
                .map(|submitted_at| RedisKey::rating(&self.namespace, creator_id, submitted_at))
                .collect();

            for record in self.load_records(&mut conn, &keys).await? {
                if !passes(&options.filter, &record) {
                    continue;
                }
                if page.records.len() == limit {
                    page.next_cursor = page.records.last().map(cursor_for).transpose()?;
                    break 'scan;
                }
                page.records.push(record);
            }

            if members.len() < batch {
                break;
            }
        }

        Ok(page)
    }

    async fn scan_all(&self, limit: usize, cursor: Option<Cursor>) -> Result<Page, AppError> {
        let limit = limit.max(1);
        let index_key = RedisKey::ratings_index(&self.namespace);

        let min = match cursor {
            Some(cursor) => {
                let key = cursor.decode()?;
                format!(
                    "({}",
                    RedisKey::index_member(&key.creator_id, &key.submitted_at)
                )
            }
            None => "-".to_string(),
        };

        let mut conn = self.conn().await?;

        let members: Vec<String> = redis::cmd("ZRANGEBYLEX")
            .arg(&index_key)
            .arg(&min)
            .arg("+")
            .arg("LIMIT")
            .arg(0)
            .arg(limit + 1)
            .query_async(&mut *conn)
            .await
            .map_err(AppError::RedisCommandError)?;

        let has_more = members.len() > limit;
        let keys: Vec<String> = members
            .iter()
            .take(limit)
            .filter_map(|member| RedisKey::split_index_member(member))
            .map(|(creator_id, submitted_at)| {
                RedisKey::rating(&self.namespace, creator_id, submitted_at)
            })
            .collect();

        let records = self.load_records(&mut conn, &keys).await?;

        // The cursor follows the index, not the loaded bodies, so a missing
        // body never makes a page repeat.
        let next_cursor = match members.get(limit.saturating_sub(1)) {
            Some(member) if has_more => match RedisKey::split_index_member(member) {
                Some((creator_id, submitted_at)) => Some(Cursor::encode(&StoreKey {
                    creator_id: creator_id.to_string(),
                    submitted_at: submitted_at.to_string(),
                })?),
                None => None,
            },
            _ => None,
        };

        Ok(Page {
            records,
            next_cursor,
        })
    }

    async fn put(&self, record: &RatingRecord) -> Result<(), AppError> {
        let json =
            serde_json::to_string(record).map_err(|e| AppError::Serialization(e.to_string()))?;

        let record_key =
            RedisKey::rating(&self.namespace, &record.creator_id, &record.submitted_at);
        let set_key = RedisKey::creator_ratings(&self.namespace, &record.creator_id);
        let index_key = RedisKey::ratings_index(&self.namespace);
        let member = RedisKey::index_member(&record.creator_id, &record.submitted_at);

        let mut conn = self.conn().await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(&record_key)
            .arg(json)
            .ignore()
            .cmd("ZADD")
            .arg(&set_key)
            .arg(0)
            .arg(&record.submitted_at)
            .ignore()
            .cmd("ZADD")
            .arg(&index_key)
            .arg(0)
            .arg(&member)
            .ignore();

        let _: () = pipe
            .query_async(&mut *conn)
            .await
            .map_err(AppError::RedisCommandError)?;

        Ok(())
    }
}
