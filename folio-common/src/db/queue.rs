//! Deployment queue operations
//!
//! FIFO by creation time. At most one row per student may sit in
//! queued/processing; approval supersedes (marks failed) any prior active
//! row before inserting a fresh one, so a student's deployment history stays
//! one lineage per attempt rather than a pile of duplicates.

use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::now_text;
use crate::model::DeploymentQueueItem;
use crate::Result;

/// Insert a fresh queued item for a student
pub async fn enqueue<'e, E>(executor: E, student_id: Uuid) -> Result<Uuid>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    let now = now_text();
    sqlx::query(
        "INSERT INTO deployment_queue (id, student_id, status, created_at, updated_at) \
         VALUES (?, ?, 'queued', ?, ?)",
    )
    .bind(id.to_string())
    .bind(student_id.to_string())
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;
    Ok(id)
}

/// Mark any queued/processing items for a student as failed with the given
/// reason (re-approval supersede, rejection cancel, refund cancel)
pub async fn cancel_active<'e, E>(executor: E, student_id: Uuid, reason: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE deployment_queue SET status = 'failed', error_message = ?, updated_at = ? \
         WHERE student_id = ? AND status IN ('queued', 'processing')",
    )
    .bind(reason)
    .bind(now_text())
    .bind(student_id.to_string())
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Oldest queued items, bounded by the batch size
pub async fn next_batch(pool: &SqlitePool, limit: u32) -> Result<Vec<DeploymentQueueItem>> {
    let rows = sqlx::query(
        "SELECT * FROM deployment_queue WHERE status = 'queued' ORDER BY created_at ASC LIMIT ?",
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;
    rows.iter().map(DeploymentQueueItem::from_row).collect()
}

/// Atomic queued -> processing claim; false means another worker invocation
/// got there first and this job should be skipped
pub async fn claim(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE deployment_queue SET status = 'processing', updated_at = ? \
         WHERE id = ? AND status = 'queued'",
    )
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_completed(pool: &SqlitePool, id: Uuid, deployment_url: &str) -> Result<()> {
    sqlx::query(
        "UPDATE deployment_queue SET status = 'completed', deployment_url = ?, \
         error_message = NULL, updated_at = ? WHERE id = ?",
    )
    .bind(deployment_url)
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a failure and bump the retry counter
pub async fn mark_failed(pool: &SqlitePool, id: Uuid, error: &str) -> Result<()> {
    sqlx::query(
        "UPDATE deployment_queue SET status = 'failed', retry_count = retry_count + 1, \
         error_message = ?, updated_at = ? WHERE id = ?",
    )
    .bind(error)
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Failed items still under the retry cap, joined with the owning student's
/// current status so the scheduler can exclude terminal business states
pub async fn failed_under_retry_cap(
    pool: &SqlitePool,
    max_retries: i64,
) -> Result<Vec<(DeploymentQueueItem, String)>> {
    let rows = sqlx::query(
        "SELECT q.*, s.status AS student_status FROM deployment_queue q \
         JOIN students s ON s.id = q.student_id \
         WHERE q.status = 'failed' AND q.retry_count < ? \
         ORDER BY q.created_at ASC",
    )
    .bind(max_retries)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            use sqlx::Row;
            let item = DeploymentQueueItem::from_row(row)?;
            let student_status: String = row.get("student_status");
            Ok((item, student_status))
        })
        .collect()
}

/// Reset a failed item back to queued, clearing the error text
pub async fn reset_for_retry(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE deployment_queue SET status = 'queued', error_message = NULL, updated_at = ? \
         WHERE id = ?",
    )
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Live sites owned by students who were rejected with a refund on file.
/// Each row is (queue item, subdomain); the pipeline tears these down.
pub async fn completed_for_refunded_students(
    pool: &SqlitePool,
) -> Result<Vec<(DeploymentQueueItem, String)>> {
    let rows = sqlx::query(
        "SELECT q.*, s.subdomain FROM deployment_queue q \
         JOIN students s ON s.id = q.student_id \
         WHERE q.status = 'completed' AND q.deployment_url IS NOT NULL \
         AND s.status = 'rejected' AND s.refund_id IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            use sqlx::Row;
            let item = DeploymentQueueItem::from_row(row)?;
            let subdomain: String = row.get("subdomain");
            Ok((item, subdomain))
        })
        .collect()
}

/// Clear the deployment URL after a teardown so the cleanup pass does not
/// pick the item up again
pub async fn mark_site_removed(pool: &SqlitePool, id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE deployment_queue SET deployment_url = NULL, \
         error_message = 'Site removed after refund', updated_at = ? WHERE id = ?",
    )
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// All items for one student, newest first
pub async fn items_for_student(
    pool: &SqlitePool,
    student_id: Uuid,
) -> Result<Vec<DeploymentQueueItem>> {
    let rows = sqlx::query(
        "SELECT * FROM deployment_queue WHERE student_id = ? ORDER BY created_at DESC",
    )
    .bind(student_id.to_string())
    .fetch_all(pool)
    .await?;
    rows.iter().map(DeploymentQueueItem::from_row).collect()
}

/// Full queue, oldest first (staff view)
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DeploymentQueueItem>> {
    let rows = sqlx::query("SELECT * FROM deployment_queue ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(DeploymentQueueItem::from_row).collect()
}

pub async fn count_queued(pool: &SqlitePool) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM deployment_queue WHERE status = 'queued'")
            .fetch_one(pool)
            .await?;
    Ok(count)
}
