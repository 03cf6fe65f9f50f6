//! Staff review endpoints
//!
//! List/detail reads, the four lifecycle actions, dashboard stats, queue
//! visibility, change-request moderation, and custom-domain management. All
//! routes here sit behind the admin bearer-token middleware.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use folio_common::db::{change_requests, content, queue, students};
use folio_common::model::{
    Assets, ChangeRequest, ChangeRequestStatus, DeploymentQueueItem, Experience, Profile, Project,
    SocialLinks, Student, StudentStatus, TierSnapshot,
};
use folio_common::{policy, quality};

use crate::error::{ApiError, ApiResult};
use crate::services::lifecycle::ActionOutcome;
use crate::AppState;

/// A pending submission with its quality gate verdict
#[derive(Debug, Serialize)]
pub struct PendingSubmission {
    #[serde(flatten)]
    pub student: Student,
    pub quality: quality::QualityCheck,
}

/// GET /api/admin/submissions
///
/// Submitted records oldest-first, each annotated with the advisory quality
/// verdict so reviewers see warnings without opening the detail view.
pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Json<Vec<PendingSubmission>>> {
    let submitted = students::list_by_status(&state.db, StudentStatus::Submitted).await?;
    let mut out = Vec::with_capacity(submitted.len());
    for student in submitted {
        let quality = quality_for(&state, student.id).await?;
        out.push(PendingSubmission { student, quality });
    }
    Ok(Json(out))
}

async fn quality_for(state: &AppState, student_id: Uuid) -> ApiResult<quality::QualityCheck> {
    let profile = content::load_profile(&state.db, student_id).await?;
    let projects = content::load_projects(&state.db, student_id).await?;
    let bio = profile.map(|p| p.bio).unwrap_or_default();
    let project_content: Vec<quality::ProjectContent> = projects
        .into_iter()
        .map(|p| quality::ProjectContent {
            description: p.description,
            tech_stack: p.tech_stack,
        })
        .collect();
    Ok(quality::validate_submission_quality(&bio, &project_content))
}

/// Full record for the review detail view
#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    pub student: Student,
    pub profile: Option<Profile>,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    pub social_links: Option<SocialLinks>,
    pub assets: Option<Assets>,
    pub tier_snapshot: Option<TierSnapshot>,
    pub quality: quality::QualityCheck,
    pub queue_items: Vec<DeploymentQueueItem>,
    pub change_requests: Vec<ChangeRequest>,
}

/// GET /api/admin/submissions/:id
pub async fn submission_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubmissionDetail>> {
    let student = students::get_student(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", id)))?;
    let quality = quality_for(&state, id).await?;
    Ok(Json(SubmissionDetail {
        profile: content::load_profile(&state.db, id).await?,
        projects: content::load_projects(&state.db, id).await?,
        experience: content::load_experience(&state.db, id).await?,
        social_links: content::load_social_links(&state.db, id).await?,
        assets: content::load_assets(&state.db, id).await?,
        tier_snapshot: content::load_tier_snapshot(&state.db, id).await?,
        queue_items: queue::items_for_student(&state.db, id).await?,
        change_requests: change_requests::list_for_student(&state.db, id).await?,
        quality,
        student,
    }))
}

/// POST /api/admin/submissions/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<ActionOutcome> {
    Json(state.lifecycle.approve(id).await)
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
    /// Defaults to refunding; staff can withhold for policy violations
    #[serde(default = "default_true")]
    pub refund: bool,
}

fn default_true() -> bool {
    true
}

/// POST /api/admin/submissions/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<Json<ActionOutcome>> {
    if req.reason.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "A rejection reason is required".to_string(),
        ));
    }
    Ok(Json(state.lifecycle.reject(id, &req.reason, req.refund).await))
}

#[derive(Debug, Deserialize)]
pub struct RequestEditsRequest {
    pub edits: Vec<String>,
}

/// POST /api/admin/submissions/:id/request-edits
pub async fn request_edits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RequestEditsRequest>,
) -> Json<ActionOutcome> {
    Json(state.lifecycle.request_edits(id, &req.edits).await)
}

/// POST /api/admin/submissions/:id/allow-resubmission
pub async fn allow_resubmission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<ActionOutcome> {
    Json(state.lifecycle.allow_resubmission(id).await)
}

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut by_status = serde_json::Map::new();
    for status in [
        StudentStatus::Submitted,
        StudentStatus::Approved,
        StudentStatus::Rejected,
        StudentStatus::EditsRequested,
        StudentStatus::Deployed,
        StudentStatus::Error,
    ] {
        let count = students::count_by_status(&state.db, status).await?;
        by_status.insert(status.as_str().to_string(), json!(count));
    }
    Ok(Json(json!({
        "total_students": students::count_students(&state.db).await?,
        "by_status": by_status,
        "queued_deployments": queue::count_queued(&state.db).await?,
        "pending_change_requests": change_requests::count_pending(&state.db).await?,
    })))
}

/// GET /api/admin/queue
pub async fn queue_overview(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DeploymentQueueItem>>> {
    Ok(Json(queue::list_all(&state.db).await?))
}

/// GET /api/admin/change-requests
pub async fn list_change_requests(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ChangeRequest>>> {
    Ok(Json(change_requests::list_all(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct ChangeRequestStatusUpdate {
    pub status: ChangeRequestStatus,
}

/// PUT /api/admin/change-requests/:id
pub async fn update_change_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeRequestStatusUpdate>,
) -> ApiResult<Json<Value>> {
    let updated = change_requests::update_status(&state.db, id, req.status).await?;
    if !updated {
        return Err(ApiError::NotFound(format!(
            "Change request {} not found",
            id
        )));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct CustomDomainUpdate {
    pub custom_domain: Option<String>,
}

/// PUT /api/admin/students/:id/custom-domain
///
/// Setting a domain is tier-gated; clearing one is always allowed.
pub async fn update_custom_domain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CustomDomainUpdate>,
) -> ApiResult<Json<Value>> {
    let student = students::get_student(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", id)))?;
    if let Some(domain) = &req.custom_domain {
        if !policy::can_use_custom_domain(student.tier) {
            return Err(ApiError::BadRequest(
                "Custom domains not available for this tier".to_string(),
            ));
        }
        if !policy::valid_custom_domain(domain) {
            return Err(ApiError::BadRequest("Invalid domain format".to_string()));
        }
    }
    students::update_custom_domain(&state.db, id, req.custom_domain.as_deref()).await?;
    Ok(Json(json!({ "success": true })))
}
