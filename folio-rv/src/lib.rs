//! folio-rv library - submission review service
//!
//! Owns the submission lifecycle: intake after checkout, staff review
//! actions, student resubmission, change requests, and the payment provider
//! webhook. Deployment itself belongs to folio-dp; this service only feeds
//! the shared queue.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod error;
pub mod services;

use services::email::Mailer;
use services::lifecycle::ReviewLifecycle;
use services::onboarding::Onboarding;
use services::payment::PaymentProvider;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub lifecycle: Arc<ReviewLifecycle>,
    pub onboarding: Arc<Onboarding>,
    pub mailer: Arc<dyn Mailer>,
    /// Staff bearer token; empty disables admin auth
    pub admin_token: String,
    /// Shared secret for webhook signatures
    pub webhook_secret: String,
    /// Apex domain the subdomains hang off
    pub apex_domain: String,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        payments: Arc<dyn PaymentProvider>,
        mailer: Arc<dyn Mailer>,
        admin_token: String,
        webhook_secret: String,
        apex_domain: String,
    ) -> Self {
        let lifecycle = Arc::new(ReviewLifecycle::new(
            db.clone(),
            payments.clone(),
            mailer.clone(),
        ));
        let onboarding = Arc::new(Onboarding::new(db.clone(), payments, mailer.clone()));
        Self {
            db,
            lifecycle,
            onboarding,
            mailer,
            admin_token,
            webhook_secret,
            apex_domain,
        }
    }
}

/// Build the application router: admin routes behind the bearer-token
/// middleware, student and webhook routes public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let admin = Router::new()
        .route("/api/admin/submissions", get(api::admin::list_pending))
        .route("/api/admin/submissions/:id", get(api::admin::submission_detail))
        .route("/api/admin/submissions/:id/approve", post(api::admin::approve))
        .route("/api/admin/submissions/:id/reject", post(api::admin::reject))
        .route(
            "/api/admin/submissions/:id/request-edits",
            post(api::admin::request_edits),
        )
        .route(
            "/api/admin/submissions/:id/allow-resubmission",
            post(api::admin::allow_resubmission),
        )
        .route("/api/admin/stats", get(api::admin::stats))
        .route("/api/admin/queue", get(api::admin::queue_overview))
        .route(
            "/api/admin/change-requests",
            get(api::admin::list_change_requests),
        )
        .route(
            "/api/admin/change-requests/:id",
            put(api::admin::update_change_request),
        )
        .route(
            "/api/admin/students/:id/custom-domain",
            put(api::admin::update_custom_domain),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::admin_auth_middleware,
        ));

    let public = Router::new()
        .route("/api/submissions", post(api::student::submit))
        .route("/api/students/:id", get(api::student::student_view))
        .route("/api/students/:id/resubmit", post(api::student::resubmit))
        .route(
            "/api/students/:id/submission",
            put(api::student::update_submission),
        )
        .route(
            "/api/students/:id/change-requests",
            post(api::change_requests::create).get(api::change_requests::list_for_student),
        )
        .route("/api/status", get(api::student::status_lookup))
        .route("/api/webhooks/payment", post(api::webhook::payment_webhook))
        .merge(api::health_routes());

    Router::new()
        .merge(admin)
        .merge(public)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
