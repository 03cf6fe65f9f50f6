//! Shared helpers for folio-dp integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

use folio_common::db::students::NewStudent;
use folio_common::db::{content, init_database_pool, queue, students};
use folio_common::email::{EmailMessage, Mailer};
use folio_common::model::{Assets, Role, SocialLinks, Tier};
use folio_common::{Error, Result};
use folio_dp::services::hosting::HostingProvider;
use folio_dp::services::worker::DeployWorker;
use folio_dp::AppState;

pub const ADMIN_TOKEN: &str = "staff-token-1";
pub const CRON_SECRET: &str = "cron-secret-1";
pub const APEX: &str = "folio.site";
pub const PREFIX: &str = "folio-";

pub async fn test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = init_database_pool(&dir.path().join("folio.db"))
        .await
        .expect("init database");
    (dir, pool)
}

/// Hosting double recording publishes and removals; `failing` makes the next
/// publish calls fail until cleared
#[derive(Default)]
pub struct FakeHosting {
    pub failing: AtomicBool,
    pub published: Mutex<Vec<(String, String)>>,
    pub removed: Mutex<Vec<String>>,
}

#[async_trait]
impl HostingProvider for FakeHosting {
    async fn publish(&self, project: &str, host: &str, _html: &str) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::External("Deployment upload returned 502".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((project.to_string(), host.to_string()));
        Ok(format!("https://{}.hosted.example", project))
    }

    async fn remove_site(&self, project: &str) -> Result<()> {
        self.removed.lock().unwrap().push(project.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestHarness {
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub hosting: Arc<FakeHosting>,
    pub mailer: Arc<RecordingMailer>,
    pub worker: Arc<DeployWorker>,
}

pub async fn harness() -> TestHarness {
    harness_with_batch(5).await
}

pub async fn harness_with_batch(batch_size: u32) -> TestHarness {
    let (dir, pool) = test_db().await;
    let hosting = Arc::new(FakeHosting::default());
    let mailer = Arc::new(RecordingMailer::default());
    let worker = Arc::new(DeployWorker::new(
        pool.clone(),
        hosting.clone(),
        mailer.clone(),
        APEX.to_string(),
        PREFIX.to_string(),
        batch_size,
        2,
    ));
    TestHarness {
        dir,
        pool,
        hosting,
        mailer,
        worker,
    }
}

pub fn app_state(h: &TestHarness) -> AppState {
    AppState {
        db: h.pool.clone(),
        worker: h.worker.clone(),
        cron_secret: CRON_SECRET.to_string(),
        admin_token: ADMIN_TOKEN.to_string(),
    }
}

/// Insert an approved student with full content and one queued deployment.
/// Returns (student id, queue item id).
pub async fn seed_queued(pool: &SqlitePool, subdomain: &str) -> (Uuid, Uuid) {
    let id = Uuid::new_v4();
    students::insert_student(
        pool,
        &NewStudent {
            id,
            name: "Jordan Rivera".to_string(),
            email: format!("{}@example.com", subdomain),
            tier: Tier::Professional,
            subdomain: subdomain.to_string(),
            payment_ref: Some(format!("pi_{}", subdomain)),
        },
    )
    .await
    .expect("insert student");

    let mut conn = pool.acquire().await.expect("acquire");
    content::insert_profile(
        &mut conn,
        id,
        Role::Developer,
        "Backend engineer focused on reliable distributed systems.",
        &["Rust".to_string()],
        &["API design".to_string()],
    )
    .await
    .expect("insert profile");
    content::insert_projects(
        &mut conn,
        id,
        &[folio_common::db::content::NewProject {
            title: "Fleet telemetry ingest".to_string(),
            description: "Streaming ingest service for vehicle telemetry.".to_string(),
            tech_stack: vec!["Rust".to_string()],
            github_url: "https://github.com/jordanr/fleet-ingest".to_string(),
            live_url: None,
        }],
    )
    .await
    .expect("insert projects");
    content::insert_social_links(&mut conn, id, &SocialLinks::default())
        .await
        .expect("insert links");
    content::insert_assets(&mut conn, id, &Assets::default())
        .await
        .expect("insert assets");
    content::insert_tier_snapshot(&mut conn, id, Tier::Professional)
        .await
        .expect("insert snapshot");

    sqlx::query("UPDATE students SET status = 'approved' WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await
        .expect("set approved");

    let item_id = queue::enqueue(pool, id).await.expect("enqueue");
    (id, item_id)
}

pub async fn force_status(pool: &SqlitePool, id: Uuid, status: &str) {
    sqlx::query("UPDATE students SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id.to_string())
        .execute(pool)
        .await
        .expect("force status");
}
