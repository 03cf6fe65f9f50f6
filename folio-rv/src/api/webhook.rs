//! Payment provider webhook
//!
//! Authenticated by a SHA-256 signature over the raw body concatenated with
//! the shared webhook secret, sent in `X-Webhook-Signature` (hex). The
//! handler always returns 200 for well-signed events it chooses to ignore,
//! so the provider does not retry them forever.
//!
//! Handled events:
//! - `charge.succeeded`: clear stale payment failure text and any prior
//!   refund id, record the provider customer reference
//! - `charge.failed`: park the record in the payment-error status
//! - `charge.refunded`: full refunds move the record to rejected unless an
//!   admin already rejected it (the admin's reason and refund id win);
//!   partial refunds are ignored

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use folio_common::db::{queue, students};

use crate::error::{ApiError, ApiResult};
use crate::services::email;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    payment_ref: String,
    #[serde(default)]
    customer_ref: Option<String>,
    #[serde(default)]
    refund_id: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    amount_refunded: Option<i64>,
    #[serde(default)]
    detail: Option<String>,
}

pub fn signature_for(body: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.update(secret.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// POST /api/webhooks/payment
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    // Without a configured secret anyone could forge a valid signature, so
    // refuse processing entirely
    if state.webhook_secret.is_empty() {
        tracing::warn!("Webhook received but no webhook secret is configured; rejecting");
        return Err(ApiError::Unauthorized(
            "Webhook processing is not configured".to_string(),
        ));
    }
    let provided = headers
        .get("X-Webhook-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing webhook signature".to_string()))?;
    let expected = signature_for(&body, &state.webhook_secret);
    if provided != expected {
        tracing::warn!("Webhook with invalid signature rejected");
        return Err(ApiError::Unauthorized("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let Some(student) =
        students::get_student_by_payment_ref(&state.db, &event.data.payment_ref).await?
    else {
        tracing::warn!(
            "Webhook {} for unknown payment {}; acknowledged without action",
            event.event_type,
            event.data.payment_ref
        );
        return Ok(Json(json!({ "received": true, "handled": false })));
    };

    let handled = match event.event_type.as_str() {
        "charge.succeeded" => {
            students::mark_payment_confirmed(&state.db, student.id, event.data.customer_ref.as_deref())
                .await?;
            tracing::info!("Payment confirmed for student {}", student.id);
            true
        }
        "charge.failed" => {
            let detail = event
                .data
                .detail
                .unwrap_or_else(|| "Payment failed".to_string());
            students::mark_payment_failed(&state.db, student.id, &detail).await?;
            tracing::info!("Payment failure recorded for student {}", student.id);
            true
        }
        "charge.refunded" => handle_refund(&state, &student, &event.data).await?,
        other => {
            tracing::debug!("Ignoring webhook event type {}", other);
            false
        }
    };

    Ok(Json(json!({ "received": true, "handled": handled })))
}

async fn handle_refund(
    state: &AppState,
    student: &folio_common::model::Student,
    data: &WebhookData,
) -> ApiResult<bool> {
    // Partial refunds carry no lifecycle meaning
    let full = match (data.amount, data.amount_refunded) {
        (Some(amount), Some(refunded)) => refunded >= amount,
        _ => true,
    };
    if !full {
        tracing::info!(
            "Partial refund for student {} ignored ({:?}/{:?})",
            student.id,
            data.amount_refunded,
            data.amount
        );
        return Ok(false);
    }

    let refund_id = data.refund_id.as_deref().unwrap_or("unknown");
    let moved = students::mark_refunded_via_webhook(&state.db, student.id, refund_id).await?;
    if !moved {
        // Admin rejected first; their reason and refund record stand
        tracing::info!(
            "Refund webhook for already-rejected student {}; no change",
            student.id
        );
        return Ok(false);
    }
    queue::cancel_active(&state.db, student.id, "Payment refunded").await?;

    let message = email::refund_processed(&student.email, &student.name);
    if let Err(e) = state.mailer.send(&message).await {
        tracing::warn!("Refund notification email failed: {}", e);
    }

    tracing::info!("Student {} moved to rejected after full refund", student.id);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_hex_sha256_of_body_plus_secret() {
        let sig = signature_for(b"{}", "secret");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, signature_for(b"{}", "other"));
        assert_ne!(sig, signature_for(b"[]", "secret"));
    }
}
