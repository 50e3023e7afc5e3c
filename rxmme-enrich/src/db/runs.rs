//! Batch run log

use crate::models::{BatchOutcome, BatchReport};
use chrono::{DateTime, Utc};
use rxmme_common::Result;
use sqlx::SqlitePool;

/// Record the outcome of a batch run
pub async fn record_run(
    pool: &SqlitePool,
    report: &BatchReport,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<()> {
    let (failed_ndc, error) = match &report.outcome {
        BatchOutcome::Aborted { ndc, error } => (Some(ndc.as_str()), Some(error.as_str())),
        _ => (None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO batch_runs (
            run_id, started_at, ended_at, outcome, failed_ndc, error,
            processed, skipped, total_records
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.run_id.to_string())
    .bind(started_at.to_rfc3339())
    .bind(ended_at.to_rfc3339())
    .bind(report.outcome.as_str())
    .bind(failed_ndc)
    .bind(error)
    .bind(report.processed as i64)
    .bind(report.skipped as i64)
    .bind(report.total_records as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Number of recorded runs with the given outcome
pub async fn count_runs(pool: &SqlitePool, outcome: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batch_runs WHERE outcome = ?")
        .bind(outcome)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
