use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::db::{deadline, StoreError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CachedResponse {
    pub id: i64,
    pub url: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>, StoreError>;

    /// Stores `payload` under `url`. An existing row for `url` is kept.
    async fn insert(&self, url: &str, payload: &[u8]) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgCacheStore {
    db: PgPool,
    timeout: Duration,
}

impl PgCacheStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>, StoreError> {
        deadline(self.timeout, async {
            let row = sqlx::query_as::<_, CachedResponse>(
                r#"
                SELECT id, url, payload
                  FROM cached_responses
                 WHERE url = $1
                "#,
            )
            .bind(url)
            .fetch_optional(&self.db)
            .await?;
            Ok::<_, StoreError>(row)
        })
        .await
    }

    async fn insert(&self, url: &str, payload: &[u8]) -> Result<(), StoreError> {
        deadline(self.timeout, async {
            // url is UNIQUE; a racing writer that lost simply keeps the first row
            sqlx::query(
                r#"
                INSERT INTO cached_responses (url, payload)
                VALUES ($1, $2)
                ON CONFLICT (url) DO NOTHING
                "#,
            )
            .bind(url)
            .bind(payload)
            .execute(&self.db)
            .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }
}

#[cfg(test)]
pub mod memory {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Mutex,
        },
    };

    use super::*;

    #[derive(Default)]
    pub struct MemoryCacheStore {
        rows: Mutex<HashMap<String, CachedResponse>>,
        next_id: AtomicUsize,
        pub inserts: AtomicUsize,
        pub fail_inserts: AtomicBool,
        pub fail_reads: AtomicBool,
    }

    impl MemoryCacheStore {
        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn payload(&self, url: &str) -> Option<Vec<u8>> {
            self.rows.lock().unwrap().get(url).map(|r| r.payload.clone())
        }
    }

    #[async_trait]
    impl CacheStore for MemoryCacheStore {
        async fn get(&self, url: &str) -> Result<Option<CachedResponse>, StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.rows.lock().unwrap().get(url).cloned())
        }

        async fn insert(&self, url: &str, payload: &[u8]) -> Result<(), StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            self.rows
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_insert_with(|| CachedResponse {
                    id,
                    url: url.to_string(),
                    payload: payload.to_vec(),
                });
            Ok(())
        }
    }

    #[tokio::test]
    async fn first_writer_wins() {
        let store = MemoryCacheStore::default();
        store.insert("u", b"one").await.unwrap();
        store.insert("u", b"two").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.payload("u").unwrap(), b"one");
        assert_eq!(store.get("u").await.unwrap().unwrap().id, 1);
    }
}
