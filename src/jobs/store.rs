use async_trait::async_trait;
use sqlx::PgPool;

use super::db;
use super::types::{DedupKey, JobPosting};

/// What the reconciler needs from persistence: keyed lookup and set-or-replace.
#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn find_one(&self, key: &DedupKey) -> Result<Option<JobPosting>, sqlx::Error>;
    /// Returns true when the key was new.
    async fn upsert(&self, posting: &JobPosting) -> Result<bool, sqlx::Error>;
}

/// Postgres-backed store over `jobs.posting`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { PgStore { pool } }
}

#[async_trait]
impl PostingStore for PgStore {
    async fn find_one(&self, key: &DedupKey) -> Result<Option<JobPosting>, sqlx::Error> {
        db::find_by_key(&self.pool, key).await
    }

    async fn upsert(&self, posting: &JobPosting) -> Result<bool, sqlx::Error> {
        db::upsert_posting(&self.pool, posting).await
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store for pipeline tests; can be told to fail after N writes.
    #[derive(Default)]
    pub struct MemoryStore {
        pub rows: Mutex<HashMap<DedupKey, JobPosting>>,
        pub writes: Mutex<Vec<DedupKey>>,
        pub fail_after: Option<usize>,
        /// Lookups always miss, as if another writer raced the reconciler.
        pub blind_reads: bool,
    }

    impl MemoryStore {
        pub fn failing_after(n: usize) -> Self {
            MemoryStore { fail_after: Some(n), ..MemoryStore::default() }
        }

        pub fn len(&self) -> usize { self.rows.lock().unwrap().len() }

        pub fn get(&self, key: &DedupKey) -> Option<JobPosting> {
            self.rows.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl PostingStore for MemoryStore {
        async fn find_one(&self, key: &DedupKey) -> Result<Option<JobPosting>, sqlx::Error> {
            if self.blind_reads {
                return Ok(None);
            }
            Ok(self.get(key))
        }

        async fn upsert(&self, posting: &JobPosting) -> Result<bool, sqlx::Error> {
            let mut writes = self.writes.lock().unwrap();
            if self.fail_after.is_some_and(|n| writes.len() >= n) {
                return Err(sqlx::Error::PoolTimedOut);
            }
            writes.push(posting.key());
            let prev = self.rows.lock().unwrap().insert(posting.key(), posting.clone());
            Ok(prev.is_none())
        }
    }
}
