//! Student-facing endpoints: onboarding intake, dashboard view, status
//! lookup, resubmission, and edits-round updates
//!
//! These routes are unauthenticated in this service; the hosted frontend
//! sits in front of them. The status lookup is deliberately sanitized to a
//! coarse label so it leaks nothing about review internals.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_common::db::{content, students};
use folio_common::model::{
    Assets, Experience, Profile, Project, SocialLinks, StudentStatus, Tier,
};

use crate::error::{ApiError, ApiResult};
use crate::services::lifecycle::ActionOutcome;
use crate::services::onboarding::{OnboardingForm, OnboardingOutcome, UpdateSubmissionForm};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub tier: Tier,
    pub payment_ref: String,
    #[serde(flatten)]
    pub form: OnboardingForm,
}

/// POST /api/submissions
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Json<OnboardingOutcome> {
    Json(state.onboarding.submit(&req.form, req.tier, &req.payment_ref).await)
}

/// Student dashboard view of one record. Payment references, refund ids,
/// and provider customer ids never appear on this surface.
#[derive(Debug, Serialize)]
pub struct StudentView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub tier: Tier,
    pub status: StudentStatus,
    pub status_label: &'static str,
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    /// Where the site is (or will be) served
    pub site_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edit_requests: Vec<String>,
    pub profile: Option<Profile>,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    pub social_links: Option<SocialLinks>,
    pub assets: Option<Assets>,
}

/// GET /api/students/:id
pub async fn student_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StudentView>> {
    let student = students::get_student(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", id)))?;
    Ok(Json(StudentView {
        status_label: student.status.display_label(),
        site_host: student.primary_host(&state.apex_domain),
        profile: content::load_profile(&state.db, id).await?,
        projects: content::load_projects(&state.db, id).await?,
        experience: content::load_experience(&state.db, id).await?,
        social_links: content::load_social_links(&state.db, id).await?,
        assets: content::load_assets(&state.db, id).await?,
        id: student.id,
        name: student.name,
        email: student.email,
        tier: student.tier,
        status: student.status,
        subdomain: student.subdomain,
        custom_domain: student.custom_domain,
        rejection_reason: student.rejection_reason,
        edit_requests: student.edit_requests,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub email: String,
}

/// Sanitized status for the public lookup form
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_host: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edit_requests: Vec<String>,
}

/// GET /api/status?email=
pub async fn status_lookup(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let student = students::get_student_by_email(&state.db, &query.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("No submission found for this email".to_string()))?;
    let site_host = match student.status {
        StudentStatus::Deployed => Some(student.primary_host(&state.apex_domain)),
        _ => None,
    };
    Ok(Json(StatusResponse {
        status_label: student.status.display_label(),
        site_host,
        edit_requests: student.edit_requests,
    }))
}

/// POST /api/students/:id/resubmit
pub async fn resubmit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<ActionOutcome> {
    Json(state.lifecycle.resubmit(id).await)
}

/// PUT /api/students/:id/submission
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<UpdateSubmissionForm>,
) -> Json<ActionOutcome> {
    Json(state.lifecycle.update_submission(id, &form).await)
}
