//! Startup schema for the shared database
//!
//! All tables use TEXT primary keys (UUID strings) and RFC 3339 TEXT
//! timestamps. Status/tier columns are snake_case TEXT matching the enums in
//! `model`. The one-active-queue-item-per-student invariant is enforced by
//! the lifecycle transitions, not by a database constraint.

use sqlx::SqlitePool;

use crate::Result;

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        tier TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'submitted',
        subdomain TEXT NOT NULL UNIQUE,
        custom_domain TEXT,
        payment_ref TEXT UNIQUE,
        customer_ref TEXT,
        rejection_reason TEXT,
        refund_id TEXT,
        edit_requests TEXT,
        error_message TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        student_id TEXT PRIMARY KEY REFERENCES students(id),
        role TEXT NOT NULL,
        bio TEXT NOT NULL,
        tech_stack TEXT NOT NULL DEFAULT '[]',
        skills TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL REFERENCES students(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        tech_stack TEXT NOT NULL DEFAULT '[]',
        github_url TEXT NOT NULL,
        live_url TEXT,
        position INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS experience (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL REFERENCES students(id),
        organization TEXT NOT NULL,
        role TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        description TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS social_links (
        student_id TEXT PRIMARY KEY REFERENCES students(id),
        github TEXT,
        linkedin TEXT,
        existing_portfolio TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assets (
        student_id TEXT PRIMARY KEY REFERENCES students(id),
        profile_photo_url TEXT,
        resume_url TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tier_snapshots (
        student_id TEXT PRIMARY KEY REFERENCES students(id),
        tier TEXT NOT NULL,
        max_projects INTEGER NOT NULL,
        custom_domain_allowed INTEGER NOT NULL,
        analytics_allowed INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS deployment_queue (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL REFERENCES students(id),
        status TEXT NOT NULL DEFAULT 'queued',
        retry_count INTEGER NOT NULL DEFAULT 0,
        error_message TEXT,
        deployment_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS change_requests (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL REFERENCES students(id),
        request_type TEXT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        is_paid INTEGER NOT NULL DEFAULT 0,
        amount INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_students_status ON students(status)",
    "CREATE INDEX IF NOT EXISTS idx_queue_status ON deployment_queue(status, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_queue_student ON deployment_queue(student_id)",
    "CREATE INDEX IF NOT EXISTS idx_change_requests_student ON change_requests(student_id)",
];

/// Create all tables and indexes if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database tables initialized");
    Ok(())
}
