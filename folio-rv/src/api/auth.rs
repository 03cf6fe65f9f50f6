//! Staff bearer-token authentication
//!
//! Applied to the admin routes only. An empty configured token disables the
//! check, which keeps local development zero-config; startup logs a warning
//! in that case.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::AppState;

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.admin_token.is_empty() {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == state.admin_token => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Admin request with invalid token rejected");
            Err(ApiError::Unauthorized("Invalid admin token".to_string()))
        }
        None => Err(ApiError::Unauthorized(
            "Missing Authorization bearer token".to_string(),
        )),
    }
}
