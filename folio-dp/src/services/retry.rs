//! Failed-deployment retry pass
//!
//! Re-queues failed items still under the retry cap, excluding items whose
//! owner has moved to rejected or edits_requested and items whose recorded
//! failure mentions a rejection or refund (those will never succeed by
//! retrying).

use sqlx::SqlitePool;

use folio_common::db::queue;
use folio_common::Result;

fn permanently_failed(error_message: Option<&str>) -> bool {
    match error_message {
        Some(text) => {
            let lower = text.to_lowercase();
            lower.contains("rejected") || lower.contains("refund")
        }
        None => false,
    }
}

pub async fn requeue_eligible(pool: &SqlitePool, max_retries: i64) -> Result<u32> {
    let mut retried = 0;
    for (item, student_status) in queue::failed_under_retry_cap(pool, max_retries).await? {
        if matches!(student_status.as_str(), "rejected" | "edits_requested") {
            continue;
        }
        if permanently_failed(item.error_message.as_deref()) {
            continue;
        }
        queue::reset_for_retry(pool, item.id).await?;
        retried += 1;
        tracing::info!(
            "Re-queued deployment {} (attempt {})",
            item.id,
            item.retry_count + 1
        );
    }
    Ok(retried)
}
