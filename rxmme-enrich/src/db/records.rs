//! Persisted result store
//!
//! Each record is stored as JSON together with its insertion position, so a
//! load reconstructs the same ordered mapping, absent fields included.

use crate::models::{EnrichedRecord, ResultStore};
use chrono::Utc;
use rxmme_common::Result;
use sqlx::SqlitePool;

/// Persistence for the accumulated result set
#[async_trait::async_trait]
pub trait RecordCache: Send + Sync {
    /// Load every stored record in insertion order
    async fn load(&self) -> Result<ResultStore>;

    /// Persist the store; records already saved are left untouched
    async fn save(&self, store: &ResultStore) -> Result<()>;
}

/// SQLite-backed [`RecordCache`]
#[derive(Clone)]
pub struct SqliteRecordCache {
    pool: SqlitePool,
}

impl SqliteRecordCache {
    /// Wrap a pool whose tables were created by [`init_tables`](super::init_tables)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RecordCache for SqliteRecordCache {
    async fn load(&self) -> Result<ResultStore> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT record FROM enriched_records ORDER BY position")
                .fetch_all(&self.pool)
                .await?;

        let records = rows
            .into_iter()
            .map(|(json,)| serde_json::from_str::<EnrichedRecord>(&json))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(records = records.len(), "Loaded result cache");
        Ok(ResultStore::from_records(records))
    }

    async fn save(&self, store: &ResultStore) -> Result<()> {
        // Serialize everything before opening the transaction
        let stored_at = Utc::now().to_rfc3339();
        let rows = store
            .iter()
            .enumerate()
            .map(|(position, record)| {
                serde_json::to_string(record).map(|json| (record.ndc.as_str(), position as i64, json))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for (ndc, position, json) in rows {
            let result = sqlx::query(
                "INSERT INTO enriched_records (ndc, position, record, stored_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(ndc) DO NOTHING",
            )
            .bind(ndc)
            .bind(position)
            .bind(json)
            .bind(&stored_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        tracing::info!(
            records = store.len(),
            new_records = inserted,
            "Result cache saved"
        );
        Ok(())
    }
}
