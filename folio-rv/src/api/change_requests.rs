//! Post-deployment change requests (student side)
//!
//! Content edits and link updates are free; template swaps and redesigns
//! carry a fixed price and stay unpaid until checkout completes. Students
//! whose submission was rejected cannot open requests.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_common::db::{change_requests, students};
use folio_common::model::{ChangeRequest, ChangeRequestStatus, ChangeRequestType, StudentStatus};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChangeRequest {
    pub request_type: ChangeRequestType,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CreateChangeResponse {
    pub id: Uuid,
    pub amount: i64,
    /// Paid request types require checkout before work starts
    pub payment_required: bool,
}

/// POST /api/students/:id/change-requests
pub async fn create(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    Json(req): Json<CreateChangeRequest>,
) -> ApiResult<Json<CreateChangeResponse>> {
    if req.description.trim().is_empty() {
        return Err(ApiError::BadRequest("A description is required".to_string()));
    }
    let student = students::get_student(&state.db, student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", student_id)))?;
    if student.status == StudentStatus::Rejected {
        return Err(ApiError::BadRequest(
            "Change requests are not available for rejected submissions".to_string(),
        ));
    }

    let amount = req.request_type.price_minor_units();
    let id = change_requests::insert(
        &state.db,
        student_id,
        req.request_type,
        req.description.trim(),
        ChangeRequestStatus::Pending,
        amount,
    )
    .await?;

    tracing::info!(
        "Change request {} ({}) opened by student {}",
        id,
        req.request_type.as_str(),
        student_id
    );

    Ok(Json(CreateChangeResponse {
        id,
        amount,
        payment_required: req.request_type.is_paid(),
    }))
}

/// GET /api/students/:id/change-requests
pub async fn list_for_student(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChangeRequest>>> {
    Ok(Json(
        change_requests::list_for_student(&state.db, student_id).await?,
    ))
}
