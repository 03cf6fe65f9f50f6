//! Lifecycle transition tests exercising the review service directly

mod common;

use common::*;
use folio_common::db::{change_requests, queue, students};
use folio_common::model::{ChangeRequestStatus, QueueStatus, StudentStatus};
use folio_rv::services::onboarding::{UpdatePersonalInfo, UpdateSubmissionForm};

#[tokio::test]
async fn approve_moves_submitted_to_approved_and_enqueues() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_approve").await;

    let outcome = h.state.lifecycle.approve(id).await;
    assert!(outcome.success, "{:?}", outcome.error);

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Approved);

    let items = queue::items_for_student(&h.pool, id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, QueueStatus::Queued);

    let subjects = h.mailer.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].to_lowercase().contains("approved"), "{}", subjects[0]);
}

#[tokio::test]
async fn approve_refuses_terminal_status() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_term").await;
    force_status(&h.pool, id, "deployed").await;

    let outcome = h.state.lifecycle.approve(id).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("deployed"));

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Deployed);
    assert!(queue::items_for_student(&h.pool, id).await.unwrap().is_empty());
}

#[tokio::test]
async fn re_approval_supersedes_the_previous_queue_item() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_requeue").await;

    assert!(h.state.lifecycle.approve(id).await.success);
    force_status(&h.pool, id, "submitted").await;
    assert!(h.state.lifecycle.approve(id).await.success);

    let items = queue::items_for_student(&h.pool, id).await.unwrap();
    assert_eq!(items.len(), 2);
    let queued: Vec<_> = items
        .iter()
        .filter(|i| i.status == QueueStatus::Queued)
        .collect();
    assert_eq!(queued.len(), 1, "exactly one live queue item after re-approval");
    assert!(items.iter().any(|i| i.status == QueueStatus::Failed));
}

#[tokio::test]
async fn reject_refunds_and_records_reason() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_reject").await;

    let outcome = h
        .state
        .lifecycle
        .reject(id, "Content does not meet our bar", true)
        .await;
    assert!(outcome.success);
    assert!(!outcome.refund_failed);

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Rejected);
    assert_eq!(
        student.rejection_reason.as_deref(),
        Some("Content does not meet our bar")
    );
    assert_eq!(student.refund_id.as_deref(), Some("re_pi_reject"));
    assert_eq!(h.payments.refunds.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn reject_on_a_terminal_status_issues_no_refund() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_noretract").await;
    force_status(&h.pool, id, "deployed").await;

    let outcome = h.state.lifecycle.reject(id, "Changed our minds", true).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("deployed"));

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Deployed);
    assert!(student.refund_id.is_none());
    assert!(
        h.payments.refunds.lock().unwrap().is_empty(),
        "a refused rejection must not move money"
    );
}

#[tokio::test]
async fn refund_failure_does_not_block_rejection() {
    let h = harness_with_payments(FakePayments {
        fail_refund: true,
        ..FakePayments::default()
    })
    .await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_refundfail").await;

    let outcome = h.state.lifecycle.reject(id, "Plagiarized content", true).await;
    assert!(outcome.success, "rejection must commit despite the refund failure");
    assert!(outcome.refund_failed);
    assert!(outcome.refund_error.is_some());

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Rejected);
    assert!(student.refund_id.is_none());
    assert!(student
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Refund failed:"));
}

#[tokio::test]
async fn reject_cancels_queued_deployment() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_cancel").await;
    assert!(h.state.lifecycle.approve(id).await.success);
    force_status(&h.pool, id, "submitted").await;

    assert!(h.state.lifecycle.reject(id, "Withdrawn", false).await.success);
    let items = queue::items_for_student(&h.pool, id).await.unwrap();
    assert!(items.iter().all(|i| i.status == QueueStatus::Failed));
}

#[tokio::test]
async fn request_edits_stores_instructions_and_audit_record() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_edits").await;

    let edits = vec![
        "Expand the bio to cover your backend work".to_string(),
        "Add a link for the second project".to_string(),
    ];
    let outcome = h.state.lifecycle.request_edits(id, &edits).await;
    assert!(outcome.success);

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::EditsRequested);
    assert_eq!(student.edit_requests, edits);

    let requests = change_requests::list_for_student(&h.pool, id).await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, ChangeRequestStatus::Approved);
    assert_eq!(requests[0].amount, 0);
}

#[tokio::test]
async fn request_edits_requires_at_least_one_instruction() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_noedits").await;
    let outcome = h.state.lifecycle.request_edits(id, &[]).await;
    assert!(!outcome.success);
    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Submitted);
}

#[tokio::test]
async fn resubmit_clears_edit_requests() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_resubmit").await;
    let edits = vec!["Tighten the project descriptions".to_string()];
    assert!(h.state.lifecycle.request_edits(id, &edits).await.success);

    let outcome = h.state.lifecycle.resubmit(id).await;
    assert!(outcome.success);

    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Submitted);
    assert!(student.edit_requests.is_empty());
}

#[tokio::test]
async fn refunded_student_cannot_resubmit_until_paid_again() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_repay").await;
    assert!(h.state.lifecycle.reject(id, "Not ready yet", true).await.success);

    let reopened = h.state.lifecycle.allow_resubmission(id).await;
    assert!(reopened.success);
    assert_eq!(reopened.payment_required, Some(true));

    let blocked = h.state.lifecycle.resubmit(id).await;
    assert!(!blocked.success);
    assert!(blocked.error.unwrap().contains("refunded"));

    // A fresh confirmed charge clears the refund and unblocks the flow
    students::mark_payment_confirmed(&h.pool, id, Some("cus_1"))
        .await
        .unwrap();
    let outcome = h.state.lifecycle.resubmit(id).await;
    assert!(outcome.success);
    let student = students::get_student(&h.pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Submitted);
}

#[tokio::test]
async fn allow_resubmission_only_applies_to_rejected() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_notrej").await;
    let outcome = h.state.lifecycle.allow_resubmission(id).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("submitted"));
}

#[tokio::test]
async fn update_submission_requires_an_open_edits_round() {
    let h = harness().await;
    let id = seed_submitted(&h.pool, "jordan@example.com", "pi_update").await;

    let form = UpdateSubmissionForm {
        personal_info: Some(UpdatePersonalInfo {
            bio: Some("A different bio".to_string()),
            ..UpdatePersonalInfo::default()
        }),
        ..UpdateSubmissionForm::default()
    };

    let blocked = h.state.lifecycle.update_submission(id, &form).await;
    assert!(!blocked.success);

    let edits = vec!["Rewrite the bio".to_string()];
    assert!(h.state.lifecycle.request_edits(id, &edits).await.success);
    let outcome = h.state.lifecycle.update_submission(id, &form).await;
    assert!(outcome.success, "{:?}", outcome.error);

    let profile = folio_common::db::content::load_profile(&h.pool, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.bio, "A different bio");
}
