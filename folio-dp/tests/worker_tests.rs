//! Worker pass tests: publish, guard, retry, and refund cleanup behavior

mod common;

use std::sync::atomic::Ordering;

use common::*;
use folio_common::db::{queue, students};
use folio_common::model::{QueueStatus, StudentStatus};

#[tokio::test]
async fn pass_deploys_an_approved_student() {
    let h = harness().await;
    let (student_id, item_id) = seed_queued(&h.pool, "jordan-rivera").await;

    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 0);

    let student = students::get_student(&h.pool, student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.status, StudentStatus::Deployed);

    let items = queue::items_for_student(&h.pool, student_id).await.unwrap();
    assert_eq!(items[0].id, item_id);
    assert_eq!(items[0].status, QueueStatus::Completed);
    assert!(items[0].deployment_url.as_deref().unwrap().starts_with("https://"));

    let published = h.hosting.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "folio-jordan-rivera");
    assert_eq!(published[0].1, "jordan-rivera.folio.site");

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("jordan-rivera.folio.site"));
}

#[tokio::test]
async fn batch_size_caps_one_pass_fifo() {
    let h = harness_with_batch(2).await;
    let (first, _) = seed_queued(&h.pool, "student-one").await;
    let (second, _) = seed_queued(&h.pool, "student-two").await;
    let (third, _) = seed_queued(&h.pool, "student-three").await;

    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.processed, 2);

    for id in [first, second] {
        let s = students::get_student(&h.pool, id).await.unwrap().unwrap();
        assert_eq!(s.status, StudentStatus::Deployed, "oldest items go first");
    }
    let s = students::get_student(&h.pool, third).await.unwrap().unwrap();
    assert_eq!(s.status, StudentStatus::Approved);

    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.processed, 1);
}

#[tokio::test]
async fn publish_failure_leaves_the_student_approved() {
    let h = harness().await;
    let (student_id, item_id) = seed_queued(&h.pool, "jordan-rivera").await;
    h.hosting.failing.store(true, Ordering::SeqCst);

    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 1);
    // The transient failure is requeued by the same pass's retry step
    assert_eq!(summary.retried, 1);

    let student = students::get_student(&h.pool, student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.status, StudentStatus::Approved);

    let item = queue::items_for_student(&h.pool, student_id).await.unwrap();
    assert_eq!(item[0].id, item_id);
    assert_eq!(item[0].status, QueueStatus::Queued);
    assert_eq!(item[0].retry_count, 1);

    // Provider recovers; the retried item deploys on the next pass
    h.hosting.failing.store(false, Ordering::SeqCst);
    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 0);
    let student = students::get_student(&h.pool, student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.status, StudentStatus::Deployed);
}

#[tokio::test]
async fn retry_cap_stops_permanent_requeueing() {
    let h = harness().await;
    let (student_id, item_id) = seed_queued(&h.pool, "jordan-rivera").await;
    h.hosting.failing.store(true, Ordering::SeqCst);

    let first = h.worker.run_pass().await.unwrap();
    assert_eq!(first.errors, 1);
    assert_eq!(first.retried, 1);

    // The second failure reaches the cap and stays down
    let second = h.worker.run_pass().await.unwrap();
    assert_eq!(second.processed, 1);
    assert_eq!(second.errors, 1);
    assert_eq!(second.retried, 0, "retry_count reached the cap");

    let items = queue::items_for_student(&h.pool, student_id).await.unwrap();
    assert_eq!(items[0].id, item_id);
    assert_eq!(items[0].status, QueueStatus::Failed);
    assert_eq!(items[0].retry_count, 2);

    let third = h.worker.run_pass().await.unwrap();
    assert_eq!(third.processed, 0);
}

#[tokio::test]
async fn rejected_owner_is_skipped_and_never_retried() {
    let h = harness().await;
    let (student_id, _) = seed_queued(&h.pool, "jordan-rivera").await;
    force_status(&h.pool, student_id, "rejected").await;

    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.retried, 0);

    let items = queue::items_for_student(&h.pool, student_id).await.unwrap();
    assert_eq!(items[0].status, QueueStatus::Failed);
    assert!(items[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("no longer approved"));
    assert!(h.hosting.published.lock().unwrap().is_empty());

    let student = students::get_student(&h.pool, student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.status, StudentStatus::Rejected);
}

#[tokio::test]
async fn refund_after_deployment_tears_the_site_down() {
    let h = harness().await;
    let (student_id, item_id) = seed_queued(&h.pool, "jordan-rivera").await;
    assert_eq!(h.worker.run_pass().await.unwrap().processed, 1);

    // Full refund lands after the site went live
    sqlx::query("UPDATE students SET status = 'rejected', refund_id = 're_1' WHERE id = ?")
        .bind(student_id.to_string())
        .execute(&h.pool)
        .await
        .unwrap();

    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(
        h.hosting.removed.lock().unwrap().as_slice(),
        ["folio-jordan-rivera"]
    );

    let items = queue::items_for_student(&h.pool, student_id).await.unwrap();
    assert_eq!(items[0].id, item_id);
    assert!(items[0].deployment_url.is_none());

    // Cleanup is one-shot
    let summary = h.worker.run_pass().await.unwrap();
    assert_eq!(summary.removed, 0);
}
