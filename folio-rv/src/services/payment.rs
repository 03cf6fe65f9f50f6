//! Payment provider client
//!
//! Confirms that a payment reference is captured and not refunded before a
//! submission may be created, and issues refunds during rejection. The
//! client is constructed once and injected into the lifecycle so tests can
//! substitute a double.

use async_trait::async_trait;
use serde::Deserialize;

use folio_common::model::Tier;
use folio_common::{Error, Result};

/// Outcome of verifying a payment reference
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    /// Payment is captured and not refunded
    pub verified: bool,
    /// Tier recorded in the payment metadata, when available
    pub tier: Option<Tier>,
    /// Human-readable reason when not verified
    pub detail: Option<String>,
}

/// External payment provider operations used by the lifecycle
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Check that the referenced payment succeeded and was not refunded
    async fn verify(&self, payment_ref: &str) -> Result<PaymentVerification>;

    /// Issue a full refund; returns the provider's refund id
    async fn refund(&self, payment_ref: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    status: String,
    #[serde(default)]
    refunded: bool,
    #[serde(default)]
    metadata: PaymentMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentMetadata {
    tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
}

/// REST payment provider client (bearer-authenticated)
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentProvider {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret_key,
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn verify(&self, payment_ref: &str) -> Result<PaymentVerification> {
        let url = format!("{}/payment_intents/{}", self.base_url, payment_ref);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| Error::External(format!("Payment lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::External(format!(
                "Payment lookup returned {}",
                response.status()
            )));
        }

        let intent: PaymentIntentResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Payment response parse failed: {}", e)))?;

        if intent.status != "succeeded" {
            return Ok(PaymentVerification {
                verified: false,
                tier: None,
                detail: Some("Payment has not succeeded".to_string()),
            });
        }

        if intent.refunded {
            return Ok(PaymentVerification {
                verified: false,
                tier: None,
                detail: Some("Payment has been refunded".to_string()),
            });
        }

        let tier = intent.metadata.tier.as_deref().and_then(|t| t.parse().ok());

        Ok(PaymentVerification {
            verified: true,
            tier,
            detail: None,
        })
    }

    async fn refund(&self, payment_ref: &str) -> Result<String> {
        let url = format!("{}/refunds", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({ "payment_intent": payment_ref }))
            .send()
            .await
            .map_err(|e| Error::External(format!("Refund request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "Refund returned {}: {}",
                status, body
            )));
        }

        let refund: RefundResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Refund response parse failed: {}", e)))?;

        Ok(refund.id)
    }
}
