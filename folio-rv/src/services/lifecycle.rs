//! Submission lifecycle transitions
//!
//! The guarded review operations: approve, reject, request edits, allow
//! resubmission, resubmit, and update-while-in-edits. Each operation
//! validates the current status through a conditional write (the status is
//! the concurrency token) and returns a discriminated outcome; provider and
//! database failures never escape an operation as a raw error.
//!
//! Side-effect ordering per operation:
//! - refunds run before the rejection write and their failure never blocks
//!   the rejection itself
//! - queue mutations share a transaction with the status write, so a
//!   student's status and its active queue item cannot diverge
//! - emails go out after commit, best-effort

use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use folio_common::db::{change_requests, content, queue, students};
use folio_common::model::{ChangeRequestStatus, ChangeRequestType, Student, StudentStatus};
use folio_common::{Error, Result};

use crate::services::email::{self, Mailer};
use crate::services::onboarding::UpdateSubmissionForm;
use crate::services::payment::PaymentProvider;

/// Discriminated result of a lifecycle operation
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Rejection committed but the refund call failed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub refund_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_error: Option<String>,
    /// Resubmission allowed, but a prior refund means payment is required
    /// again first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_required: Option<bool>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            refund_failed: false,
            refund_error: None,
            payment_required: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            refund_failed: false,
            refund_error: None,
            payment_required: None,
        }
    }
}

fn status_guard_error(operation: &str, status: StudentStatus) -> String {
    format!(
        "Cannot {} submission with status \"{}\"",
        operation,
        status.as_str()
    )
}

/// Review lifecycle with injected provider clients
pub struct ReviewLifecycle {
    db: SqlitePool,
    payments: Arc<dyn PaymentProvider>,
    mailer: Arc<dyn Mailer>,
}

impl ReviewLifecycle {
    pub fn new(db: SqlitePool, payments: Arc<dyn PaymentProvider>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            payments,
            mailer,
        }
    }

    async fn load_student(&self, id: Uuid) -> Result<Option<Student>> {
        students::get_student(&self.db, id).await
    }

    async fn send_email(&self, message: email::EmailMessage) {
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!("Notification email failed: {}", e);
        }
    }

    /// Approve a submission: status -> approved, supersede any active queue
    /// item, insert a fresh queued item, notify the student.
    pub async fn approve(&self, student_id: Uuid) -> ActionOutcome {
        match self.approve_inner(student_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to approve submission {}: {}", student_id, e);
                ActionOutcome::fail("Failed to approve submission")
            }
        }
    }

    async fn approve_inner(&self, student_id: Uuid) -> Result<ActionOutcome> {
        let Some(student) = self.load_student(student_id).await? else {
            return Ok(ActionOutcome::fail("Student not found"));
        };

        let mut tx = self.db.begin().await?;
        let moved = students::transition_status(
            &mut *tx,
            student_id,
            &[StudentStatus::Submitted, StudentStatus::EditsRequested],
            StudentStatus::Approved,
        )
        .await?;
        if !moved {
            return Ok(ActionOutcome::fail(status_guard_error(
                "approve",
                student.status,
            )));
        }
        queue::cancel_active(&mut *tx, student_id, "Superseded by re-approval").await?;
        queue::enqueue(&mut *tx, student_id).await?;
        tx.commit().await?;

        tracing::info!("Submission {} approved and queued for deployment", student_id);
        self.send_email(email::submission_approved(&student.email, &student.name))
            .await;

        Ok(ActionOutcome::ok())
    }

    /// Reject a submission, optionally refunding first. A refund failure is
    /// reported but never blocks the rejection.
    pub async fn reject(
        &self,
        student_id: Uuid,
        reason: &str,
        should_refund: bool,
    ) -> ActionOutcome {
        match self.reject_inner(student_id, reason, should_refund).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to reject submission {}: {}", student_id, e);
                ActionOutcome::fail("Failed to reject submission")
            }
        }
    }

    async fn reject_inner(
        &self,
        student_id: Uuid,
        reason: &str,
        should_refund: bool,
    ) -> Result<ActionOutcome> {
        let Some(student) = self.load_student(student_id).await? else {
            return Ok(ActionOutcome::fail("Student not found"));
        };
        // Refuse before any money moves; the conditional update below stays
        // as the race guard
        if !matches!(
            student.status,
            StudentStatus::Submitted | StudentStatus::EditsRequested
        ) {
            return Ok(ActionOutcome::fail(status_guard_error(
                "reject",
                student.status,
            )));
        }

        // Refund before the status write; its outcome is recorded either way
        let mut refund_id: Option<String> = None;
        let mut refund_error: Option<String> = None;
        if should_refund {
            match &student.payment_ref {
                Some(payment_ref) => match self.payments.refund(payment_ref).await {
                    Ok(id) => {
                        tracing::info!("Refund {} issued for student {}", id, student_id);
                        refund_id = Some(id);
                    }
                    Err(e) => {
                        tracing::error!("Refund failed for student {}: {}", student_id, e);
                        refund_error = Some(e.to_string());
                    }
                },
                None => {
                    refund_error = Some("No payment reference on file".to_string());
                }
            }
        }

        let refund_failure_text = refund_error
            .as_ref()
            .map(|e| format!("Refund failed: {}", e));

        let mut tx = self.db.begin().await?;
        let moved = students::mark_rejected(
            &mut *tx,
            student_id,
            reason,
            refund_id.as_deref(),
            refund_failure_text.as_deref(),
        )
        .await?;
        if !moved {
            return Ok(ActionOutcome::fail(status_guard_error(
                "reject",
                student.status,
            )));
        }
        queue::cancel_active(&mut *tx, student_id, "Submission rejected").await?;
        tx.commit().await?;

        self.send_email(email::submission_rejected(
            &student.email,
            &student.name,
            reason,
            refund_id.is_some(),
        ))
        .await;

        let refund_failed = refund_error.is_some();
        Ok(ActionOutcome {
            success: true,
            error: None,
            refund_failed,
            refund_error,
            payment_required: None,
        })
    }

    /// Request edits on a submitted record: status -> edits_requested, store
    /// the instructions, and leave a pre-approved content_edit change request
    /// as the audit record.
    pub async fn request_edits(&self, student_id: Uuid, edits: &[String]) -> ActionOutcome {
        if edits.is_empty() {
            return ActionOutcome::fail("At least one edit request is required");
        }
        match self.request_edits_inner(student_id, edits).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to request edits for {}: {}", student_id, e);
                ActionOutcome::fail("Failed to send edit request")
            }
        }
    }

    async fn request_edits_inner(&self, student_id: Uuid, edits: &[String]) -> Result<ActionOutcome> {
        let Some(student) = self.load_student(student_id).await? else {
            return Ok(ActionOutcome::fail("Student not found"));
        };

        let mut tx = self.db.begin().await?;
        let moved = students::mark_edits_requested(&mut *tx, student_id, edits).await?;
        if !moved {
            return Ok(ActionOutcome::fail(status_guard_error(
                "request edits for",
                student.status,
            )));
        }
        let description = format!("Admin requested edits:\n• {}", edits.join("\n• "));
        change_requests::insert(
            &mut *tx,
            student_id,
            ChangeRequestType::ContentEdit,
            &description,
            // Pre-approved since staff are the ones requesting
            ChangeRequestStatus::Approved,
            0,
        )
        .await?;
        tx.commit().await?;

        self.send_email(email::edits_requested(&student.email, &student.name, edits))
            .await;

        Ok(ActionOutcome::ok())
    }

    /// Reopen a rejected submission for another edits round. A previously
    /// issued refund stays on file, which keeps resubmission blocked until a
    /// new payment clears it.
    pub async fn allow_resubmission(&self, student_id: Uuid) -> ActionOutcome {
        match self.allow_resubmission_inner(student_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to allow resubmission for {}: {}", student_id, e);
                ActionOutcome::fail("Failed to allow resubmission")
            }
        }
    }

    async fn allow_resubmission_inner(&self, student_id: Uuid) -> Result<ActionOutcome> {
        let Some(student) = self.load_student(student_id).await? else {
            return Ok(ActionOutcome::fail("Student not found"));
        };

        let moved = students::transition_status(
            &self.db,
            student_id,
            &[StudentStatus::Rejected],
            StudentStatus::EditsRequested,
        )
        .await?;
        if !moved {
            return Ok(ActionOutcome::fail(status_guard_error(
                "allow resubmission for",
                student.status,
            )));
        }

        let payment_required = student.refund_id.is_some();
        if payment_required {
            tracing::info!(
                "Student {} reopened for edits; refund on file, payment required before resubmission",
                student_id
            );
        }

        Ok(ActionOutcome {
            payment_required: Some(payment_required),
            ..ActionOutcome::ok()
        })
    }

    /// Student-initiated resubmit after completing requested edits
    pub async fn resubmit(&self, student_id: Uuid) -> ActionOutcome {
        match self.resubmit_inner(student_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to resubmit {}: {}", student_id, e);
                ActionOutcome::fail("Failed to resubmit")
            }
        }
    }

    async fn resubmit_inner(&self, student_id: Uuid) -> Result<ActionOutcome> {
        let Some(student) = self.load_student(student_id).await? else {
            return Ok(ActionOutcome::fail("Student not found"));
        };
        if student.refund_id.is_some() {
            return Ok(ActionOutcome::fail(
                "Your payment was refunded. Please make a new payment to resubmit.",
            ));
        }

        let moved = students::mark_resubmitted(&self.db, student_id).await?;
        if !moved {
            return Ok(ActionOutcome::fail(status_guard_error(
                "resubmit",
                student.status,
            )));
        }

        Ok(ActionOutcome::ok())
    }

    /// Wholesale content update during an edits round
    pub async fn update_submission(
        &self,
        student_id: Uuid,
        form: &UpdateSubmissionForm,
    ) -> ActionOutcome {
        match self.update_submission_inner(student_id, form).await {
            Ok(outcome) => outcome,
            Err(Error::Conflict(msg)) => ActionOutcome::fail(msg),
            Err(e) => {
                tracing::error!("Failed to update submission {}: {}", student_id, e);
                ActionOutcome::fail("Failed to update submission")
            }
        }
    }

    async fn update_submission_inner(
        &self,
        student_id: Uuid,
        form: &UpdateSubmissionForm,
    ) -> Result<ActionOutcome> {
        let Some(student) = self.load_student(student_id).await? else {
            return Ok(ActionOutcome::fail("Student not found"));
        };
        if student.status != StudentStatus::EditsRequested {
            return Ok(ActionOutcome::fail(format!(
                "Cannot update submission with status \"{}\". Only edits_requested submissions can be updated.",
                student.status.as_str()
            )));
        }
        if student.refund_id.is_some() {
            return Ok(ActionOutcome::fail(
                "Your payment was refunded. Please make a new payment to resubmit.",
            ));
        }

        let mut tx = self.db.begin().await?;

        if let Some(personal) = &form.personal_info {
            students::update_identity(
                &mut *tx,
                student_id,
                personal.name.as_deref(),
                personal.email.as_deref(),
            )
            .await?;
        }

        let bio = form.personal_info.as_ref().and_then(|p| p.bio.as_deref());
        let (role, tech_stack, skills) = match &form.technical_profile {
            Some(profile) => (
                profile.role,
                profile.tech_stack.as_deref(),
                profile.skills.as_deref(),
            ),
            None => (None, None, None),
        };
        if bio.is_some() || role.is_some() || tech_stack.is_some() || skills.is_some() {
            content::update_profile(&mut tx, student_id, role, bio, tech_stack, skills).await?;
        }

        if let Some(projects) = &form.projects {
            if !projects.is_empty() {
                content::replace_projects(&mut tx, student_id, projects).await?;
            }
        }
        if let Some(experience) = &form.experience {
            content::replace_experience(&mut tx, student_id, experience).await?;
        }
        if let Some(links) = &form.social_links {
            content::update_social_links(&mut tx, student_id, links).await?;
        }

        tx.commit().await?;
        Ok(ActionOutcome::ok())
    }
}
