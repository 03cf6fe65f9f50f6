//! Database layer tests: schema init, guarded status writes, queue
//! supersede/claim semantics

use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use folio_common::db::{self, queue, students};
use folio_common::model::{QueueStatus, StudentStatus, Tier};

/// Create a temporary database with the full schema applied.
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for the
/// duration of the test.
async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("folio_test.db");
    let pool = db::init_database_pool(&db_path).await.unwrap();
    (temp_dir, pool)
}

async fn seed_student(pool: &SqlitePool, email: &str, subdomain: &str) -> Uuid {
    let id = Uuid::new_v4();
    students::insert_student(
        pool,
        &students::NewStudent {
            id,
            name: "Ada Tan".to_string(),
            email: email.to_string(),
            tier: Tier::Starter,
            subdomain: subdomain.to_string(),
            payment_ref: Some(format!("pi_{}", subdomain)),
        },
    )
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn schema_initializes_and_student_round_trips() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;

    let student = students::get_student(&pool, id).await.unwrap().unwrap();
    assert_eq!(student.email, "ada@example.com");
    assert_eq!(student.status, StudentStatus::Submitted);
    assert_eq!(student.tier, Tier::Starter);
    assert!(student.rejection_reason.is_none());
    assert!(student.edit_requests.is_empty());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (_dir, pool) = create_test_db().await;
    seed_student(&pool, "ada@example.com", "ada-tan").await;

    let err = students::insert_student(
        &pool,
        &students::NewStudent {
            id: Uuid::new_v4(),
            name: "Other".to_string(),
            email: "ada@example.com".to_string(),
            tier: Tier::Starter,
            subdomain: "other".to_string(),
            payment_ref: Some("pi_other".to_string()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, folio_common::Error::Conflict(_)));
}

#[tokio::test]
async fn guarded_transition_refuses_wrong_starting_status() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;

    // submitted -> approved succeeds
    let moved = students::transition_status(
        &pool,
        id,
        &[StudentStatus::Submitted, StudentStatus::EditsRequested],
        StudentStatus::Approved,
    )
    .await
    .unwrap();
    assert!(moved);

    // approved is not in the allowed-from set, so a repeat write is a no-op
    let moved_again = students::transition_status(
        &pool,
        id,
        &[StudentStatus::Submitted, StudentStatus::EditsRequested],
        StudentStatus::Approved,
    )
    .await
    .unwrap();
    assert!(!moved_again);

    let student = students::get_student(&pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::Approved);
}

#[tokio::test]
async fn mark_edits_requested_only_from_submitted() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;

    let edits = vec!["Expand the bio".to_string(), "Add outcomes".to_string()];
    assert!(students::mark_edits_requested(&pool, id, &edits).await.unwrap());

    let student = students::get_student(&pool, id).await.unwrap().unwrap();
    assert_eq!(student.status, StudentStatus::EditsRequested);
    assert_eq!(student.edit_requests, edits);

    // Second call fails the guard: status is no longer submitted
    assert!(!students::mark_edits_requested(&pool, id, &edits).await.unwrap());
}

#[tokio::test]
async fn webhook_refund_does_not_overwrite_admin_rejection() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;

    assert!(
        students::mark_rejected(&pool, id, "low quality", Some("re_123"), None)
            .await
            .unwrap()
    );

    // Refund webhook arrives later for the same student; the rejected row is
    // excluded from the predicate, so nothing changes
    assert!(!students::mark_refunded_via_webhook(&pool, id, "re_webhook")
        .await
        .unwrap());

    let student = students::get_student(&pool, id).await.unwrap().unwrap();
    assert_eq!(student.rejection_reason.as_deref(), Some("low quality"));
    assert_eq!(student.refund_id.as_deref(), Some("re_123"));
}

#[tokio::test]
async fn enqueue_supersedes_prior_active_item() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;

    let first = queue::enqueue(&pool, id).await.unwrap();
    queue::cancel_active(&pool, id, "Superseded by re-approval")
        .await
        .unwrap();
    let second = queue::enqueue(&pool, id).await.unwrap();

    let items = queue::items_for_student(&pool, id).await.unwrap();
    assert_eq!(items.len(), 2);

    let first_item = items.iter().find(|i| i.id == first).unwrap();
    let second_item = items.iter().find(|i| i.id == second).unwrap();
    assert_eq!(first_item.status, QueueStatus::Failed);
    assert_eq!(
        first_item.error_message.as_deref(),
        Some("Superseded by re-approval")
    );
    assert_eq!(second_item.status, QueueStatus::Queued);
}

#[tokio::test]
async fn claim_is_single_winner() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;
    let item = queue::enqueue(&pool, id).await.unwrap();

    assert!(queue::claim(&pool, item).await.unwrap());
    assert!(!queue::claim(&pool, item).await.unwrap());
}

#[tokio::test]
async fn failed_items_join_student_status_for_retry_filtering() {
    let (_dir, pool) = create_test_db().await;
    let id = seed_student(&pool, "ada@example.com", "ada-tan").await;
    let item = queue::enqueue(&pool, id).await.unwrap();
    queue::mark_failed(&pool, item, "hosting provider timeout")
        .await
        .unwrap();

    let eligible = queue::failed_under_retry_cap(&pool, 2).await.unwrap();
    assert_eq!(eligible.len(), 1);
    let (failed, student_status) = &eligible[0];
    assert_eq!(failed.retry_count, 1);
    assert_eq!(student_status, "submitted");

    // Past the retry cap the item drops out
    queue::mark_failed(&pool, item, "hosting provider timeout again")
        .await
        .unwrap();
    let eligible = queue::failed_under_retry_cap(&pool, 2).await.unwrap();
    assert!(eligible.is_empty());
}
