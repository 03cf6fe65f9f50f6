//! Deployment trigger endpoint
//!
//! POST /deploy runs one worker pass. Intended for an external scheduler,
//! so it accepts the cron secret as a bearer token; the staff admin token
//! works too for manual runs. With neither secret configured the endpoint
//! is open (local development).

use axum::{extract::State, http::HeaderMap, Json};

use crate::error::{ApiError, ApiResult};
use crate::services::worker::PassSummary;
use crate::AppState;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// POST /deploy
pub async fn trigger_deploy(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<PassSummary>> {
    let auth_required = !state.cron_secret.is_empty() || !state.admin_token.is_empty();
    if auth_required {
        let authorized = match bearer(&headers) {
            Some(token) => {
                (!state.cron_secret.is_empty() && token == state.cron_secret)
                    || (!state.admin_token.is_empty() && token == state.admin_token)
            }
            None => false,
        };
        if !authorized {
            tracing::warn!("Deploy trigger with missing or invalid token rejected");
            return Err(ApiError::Unauthorized(
                "Invalid deploy trigger token".to_string(),
            ));
        }
    }

    let summary = state.worker.run_pass().await?;
    tracing::info!(
        "Deploy trigger: {} processed, {} errors, {} retried, {} removed",
        summary.processed,
        summary.errors,
        summary.retried,
        summary.removed
    );
    Ok(Json(summary))
}
