//! Database access for the Folio services
//!
//! Both services open the same SQLite database file. Schema creation is
//! idempotent and runs on every startup.

pub mod change_requests;
pub mod content;
pub mod queue;
pub mod schema;
pub mod students;

use sqlx::SqlitePool;
use std::path::Path;

use crate::Result;

/// Initialize database connection pool
///
/// Connects with mode=rwc (read, write, create) and creates any missing
/// tables before returning.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    schema::init_tables(&pool).await?;

    Ok(pool)
}

/// Current RFC 3339 timestamp for created_at/updated_at columns
pub(crate) fn now_text() -> String {
    chrono::Utc::now().to_rfc3339()
}
