//! folio-dp library - deployment pipeline service
//!
//! Consumes the deployment queue folio-rv feeds: renders approved
//! portfolios, publishes them through the hosting provider, retries
//! transient failures, and tears down sites after refunds. Triggered by an
//! external scheduler via POST /deploy, with an optional built-in poll
//! loop.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod error;
pub mod render;
pub mod services;

use services::worker::DeployWorker;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub worker: Arc<DeployWorker>,
    /// Scheduler bearer token; empty falls back to the admin token
    pub cron_secret: String,
    /// Staff bearer token accepted for manual triggers
    pub admin_token: String,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;

    Router::new()
        .route("/deploy", post(api::trigger_deploy))
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
