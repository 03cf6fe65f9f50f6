//! Change request rows
//!
//! Change requests live on their own lifecycle and never touch the
//! deployment queue directly.

use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::now_text;
use crate::model::{ChangeRequest, ChangeRequestStatus, ChangeRequestType};
use crate::Result;

pub async fn insert<'e, E>(
    executor: E,
    student_id: Uuid,
    request_type: ChangeRequestType,
    description: &str,
    status: ChangeRequestStatus,
    amount: i64,
) -> Result<Uuid>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO change_requests (id, student_id, request_type, description, status, is_paid, amount, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(student_id.to_string())
    .bind(request_type.as_str())
    .bind(description)
    .bind(status.as_str())
    // is_paid reflects an actual captured payment, not the price; paid types
    // start false and flip after checkout
    .bind(false)
    .bind(amount)
    .bind(now_text())
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn list_for_student(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<ChangeRequest>> {
    let rows = sqlx::query(
        "SELECT * FROM change_requests WHERE student_id = ? ORDER BY created_at DESC",
    )
    .bind(student_id.to_string())
    .fetch_all(pool)
    .await?;
    rows.iter().map(ChangeRequest::from_row).collect()
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ChangeRequest>> {
    let rows = sqlx::query("SELECT * FROM change_requests ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(ChangeRequest::from_row).collect()
}

pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: ChangeRequestStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE change_requests SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_pending(pool: &SqlitePool) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM change_requests WHERE status = 'pending'")
            .fetch_one(pool)
            .await?;
    Ok(count)
}
