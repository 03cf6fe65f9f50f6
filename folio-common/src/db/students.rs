//! Student row operations
//!
//! Every transition writes through a conditional
//! `UPDATE ... WHERE id = ? AND status IN (...)` and reports whether a row
//! changed, so the current status acts as the concurrency token: a stale
//! caller's write affects zero rows instead of clobbering a newer state.

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::now_text;
use crate::model::{Student, StudentStatus, Tier};
use crate::{Error, Result};

/// Fields for a new student row; everything else starts at its default
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub tier: Tier,
    pub subdomain: String,
    pub payment_ref: Option<String>,
}

pub async fn insert_student<'e, E>(executor: E, student: &NewStudent) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = now_text();
    sqlx::query(
        r#"
        INSERT INTO students (id, name, email, tier, status, subdomain, payment_ref, created_at, updated_at)
        VALUES (?, ?, ?, ?, 'submitted', ?, ?, ?, ?)
        "#,
    )
    .bind(student.id.to_string())
    .bind(&student.name)
    .bind(&student.email)
    .bind(student.tier.as_str())
    .bind(&student.subdomain)
    .bind(&student.payment_ref)
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await
    .map_err(|e| Error::from(e).conflict_on_unique("A student with this email or subdomain"))?;
    Ok(())
}

async fn fetch_student<'e, E>(executor: E, sql: &str, bind: &str) -> Result<Option<Student>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<SqliteRow> = sqlx::query(sql).bind(bind).fetch_optional(executor).await?;
    row.map(|r| Student::from_row(&r)).transpose()
}

pub async fn get_student(pool: &SqlitePool, id: Uuid) -> Result<Option<Student>> {
    fetch_student(
        pool,
        "SELECT * FROM students WHERE id = ?",
        &id.to_string(),
    )
    .await
}

pub async fn get_student_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Student>> {
    fetch_student(pool, "SELECT * FROM students WHERE email = ?", email).await
}

pub async fn get_student_by_payment_ref(
    pool: &SqlitePool,
    payment_ref: &str,
) -> Result<Option<Student>> {
    fetch_student(
        pool,
        "SELECT * FROM students WHERE payment_ref = ?",
        payment_ref,
    )
    .await
}

pub async fn subdomain_taken(pool: &SqlitePool, subdomain: &str) -> Result<bool> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM students WHERE subdomain = ?")
        .bind(subdomain)
        .fetch_optional(pool)
        .await?;
    Ok(existing.is_some())
}

/// All students, newest first (staff overview)
pub async fn list_students(pool: &SqlitePool) -> Result<Vec<Student>> {
    let rows = sqlx::query("SELECT * FROM students ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(Student::from_row).collect()
}

/// Students in one status, oldest first (review queue order)
pub async fn list_by_status(pool: &SqlitePool, status: StudentStatus) -> Result<Vec<Student>> {
    let rows = sqlx::query("SELECT * FROM students WHERE status = ? ORDER BY created_at ASC")
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    rows.iter().map(Student::from_row).collect()
}

pub async fn count_by_status(pool: &SqlitePool, status: StudentStatus) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE status = ?")
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_students(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn status_in_clause(allowed_from: &[StudentStatus]) -> String {
    allowed_from
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Guarded status-only transition; true when a row actually changed
pub async fn transition_status<'e, E>(
    executor: E,
    id: Uuid,
    allowed_from: &[StudentStatus],
    to: StudentStatus,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE students SET status = ?, updated_at = ? WHERE id = ? AND status IN ({})",
        status_in_clause(allowed_from)
    );
    let result = sqlx::query(&sql)
        .bind(to.as_str())
        .bind(now_text())
        .bind(id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Guarded rejection write: status, reason, refund id, and refund-failure
/// text land in one statement
pub async fn mark_rejected<'e, E>(
    executor: E,
    id: Uuid,
    reason: &str,
    refund_id: Option<&str>,
    refund_failure: Option<&str>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE students SET status = 'rejected', rejection_reason = ?, refund_id = ?, \
         error_message = ?, updated_at = ? WHERE id = ? AND status IN ({})",
        status_in_clause(&[StudentStatus::Submitted, StudentStatus::EditsRequested])
    );
    let result = sqlx::query(&sql)
        .bind(reason)
        .bind(refund_id)
        .bind(refund_failure)
        .bind(now_text())
        .bind(id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Guarded edits-requested write storing the instruction list as JSON
pub async fn mark_edits_requested<'e, E>(
    executor: E,
    id: Uuid,
    edit_requests: &[String],
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let json = serde_json::to_string(edit_requests)
        .map_err(|e| Error::Internal(format!("Failed to serialize edit requests: {}", e)))?;
    let result = sqlx::query(
        "UPDATE students SET status = 'edits_requested', edit_requests = ?, updated_at = ? \
         WHERE id = ? AND status = 'submitted'",
    )
    .bind(json)
    .bind(now_text())
    .bind(id.to_string())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Guarded resubmit write clearing prior edit/error text
pub async fn mark_resubmitted<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE students SET status = 'submitted', edit_requests = NULL, error_message = NULL, \
         updated_at = ? WHERE id = ? AND status = 'edits_requested'",
    )
    .bind(now_text())
    .bind(id.to_string())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Webhook path: record a refund issued outside the admin flow.
///
/// Must not overwrite an already-admin-rejected student's reason/refund data,
/// so rejected rows are excluded from the predicate.
pub async fn mark_refunded_via_webhook<'e, E>(executor: E, id: Uuid, refund_id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE students SET status = 'rejected', rejection_reason = 'Payment refunded', \
         refund_id = ?, updated_at = ? WHERE id = ? AND status != 'rejected'",
    )
    .bind(refund_id)
    .bind(now_text())
    .bind(id.to_string())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Webhook path: payment failed before review could proceed
pub async fn mark_payment_failed(pool: &SqlitePool, id: Uuid, detail: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE students SET status = 'error', error_message = ?, updated_at = ? WHERE id = ?",
    )
    .bind(detail)
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Webhook path: charge confirmed. Clears stale payment error text and any
/// prior refund id (a fresh payment supersedes it, unblocking resubmission)
/// and stores the provider customer reference when present.
pub async fn mark_payment_confirmed(
    pool: &SqlitePool,
    id: Uuid,
    customer_ref: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE students SET error_message = NULL, refund_id = NULL, \
         customer_ref = COALESCE(?, customer_ref), updated_at = ? WHERE id = ?",
    )
    .bind(customer_ref)
    .bind(now_text())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_custom_domain<'e, E>(
    executor: E,
    id: Uuid,
    custom_domain: Option<&str>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result =
        sqlx::query("UPDATE students SET custom_domain = ?, updated_at = ? WHERE id = ?")
            .bind(custom_domain)
            .bind(now_text())
            .bind(id.to_string())
            .execute(executor)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Name/email update during an edits round; unique-email collisions are
/// translated to a conflict error
pub async fn update_identity<'e, E>(
    executor: E,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE students SET name = COALESCE(?, name), email = COALESCE(?, email), \
         updated_at = ? WHERE id = ?",
    )
    .bind(name)
    .bind(email)
    .bind(now_text())
    .bind(id.to_string())
    .execute(executor)
    .await
    .map_err(|e| Error::from(e).conflict_on_unique("A student with this email"))?;
    Ok(())
}
