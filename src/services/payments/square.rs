use anyhow::Context;
use async_trait::async_trait;
use axum::http::HeaderMap;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::PaymentProvider;
use crate::errors::{AppError, AppResult};
use crate::models::payment::from_minor_units;
use crate::models::{Booking, PaymentIntentRef, PaymentOutcome, WebhookEvent};

const SANDBOX_BASE: &str = "https://connect.squareupsandbox.com";
const PRODUCTION_BASE: &str = "https://connect.squareup.com";
const API_VERSION: &str = "2024-06-04";

pub struct SquareProvider {
    access_token: String,
    location_id: String,
    base_url: &'static str,
    currency: String,
    webhook_signature_key: String,
    webhook_url: String,
    client: reqwest::Client,
}

impl SquareProvider {
    pub fn new(
        access_token: String,
        location_id: String,
        environment: &str,
        currency: String,
        webhook_signature_key: String,
        webhook_url: String,
    ) -> Self {
        let base_url = if environment.eq_ignore_ascii_case("production") {
            PRODUCTION_BASE
        } else {
            SANDBOX_BASE
        };
        Self {
            access_token,
            location_id,
            base_url,
            currency: currency.to_uppercase(),
            webhook_signature_key,
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Money {
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct Payment {
    id: String,
    status: String,
    reference_id: Option<String>,
    amount_money: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct SquareError {
    category: String,
    code: String,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    payment: Option<Payment>,
    #[serde(default)]
    errors: Vec<SquareError>,
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "type")]
    kind: String,
    data: NotificationData,
}

#[derive(Debug, Deserialize)]
struct NotificationData {
    object: NotificationObject,
}

#[derive(Debug, Deserialize)]
struct NotificationObject {
    payment: Payment,
}

/// Same booking and nonce always yield the same key, so a retried request
/// cannot charge twice.
fn idempotency_key(booking_id: &str, token: &str) -> String {
    let digest = Sha256::digest(format!("{booking_id}:{token}").as_bytes());
    hex::encode(digest)[..40].to_string()
}

fn outcome_for(payment: &Payment, fallback_amount: i64) -> Option<PaymentOutcome> {
    match payment.status.as_str() {
        "COMPLETED" => Some(PaymentOutcome::Succeeded {
            reference: payment.id.clone(),
            amount: from_minor_units(
                payment
                    .amount_money
                    .as_ref()
                    .map(|m| m.amount)
                    .unwrap_or(fallback_amount),
            ),
        }),
        "FAILED" | "CANCELED" => Some(PaymentOutcome::Failed {
            reason: format!("payment {}", payment.status.to_lowercase()),
        }),
        _ => None,
    }
}

/// Checks `x-square-hmacsha256-signature`: base64 HMAC-SHA256 of the
/// notification URL followed by the raw body.
pub fn verify_signature(key: &str, notification_url: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key.as_bytes()) else {
        return false;
    };
    mac.update(notification_url.as_bytes());
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[async_trait]
impl PaymentProvider for SquareProvider {
    fn name(&self) -> &'static str {
        "square"
    }

    /// The card form tokenises client-side, so nothing is created remotely
    /// until `settle`.
    async fn create_intent(
        &self,
        booking: &Booking,
        amount_minor: i64,
    ) -> anyhow::Result<PaymentIntentRef> {
        Ok(PaymentIntentRef {
            reference: None,
            payload: serde_json::json!({
                "success": true,
                "paymentRequest": {
                    "amount": amount_minor,
                    "currency": self.currency,
                    "bookingId": booking.id,
                    "clientName": booking.client_name,
                    "serviceType": booking.service_type,
                    "description": booking.description(),
                },
            }),
        })
    }

    async fn settle(
        &self,
        booking: &Booking,
        provider_token: &str,
        amount_minor: i64,
    ) -> anyhow::Result<Option<PaymentOutcome>> {
        let body = serde_json::json!({
            "source_id": provider_token,
            "idempotency_key": idempotency_key(&booking.id, provider_token),
            "amount_money": {"amount": amount_minor, "currency": self.currency},
            "location_id": self.location_id,
            "reference_id": booking.id,
            "note": booking.description(),
            "buyer_email_address": booking.client_email,
        });

        let response = self
            .client
            .post(format!("{}/v2/payments", self.base_url))
            .bearer_auth(&self.access_token)
            .header("Square-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .context("failed to reach Square")?;
        let status = response.status();
        let parsed: CreatePaymentResponse = response
            .json()
            .await
            .context("invalid Square payment response")?;

        if let Some(error) = parsed.errors.first() {
            if error.category == "PAYMENT_METHOD_ERROR" {
                return Ok(Some(PaymentOutcome::Failed {
                    reason: error.detail.clone().unwrap_or_else(|| error.code.clone()),
                }));
            }
            anyhow::bail!("Square returned {status}: {} {}", error.category, error.code);
        }

        let payment = parsed
            .payment
            .with_context(|| format!("Square returned {status} without a payment"))?;
        Ok(outcome_for(&payment, amount_minor))
    }

    fn parse_webhook(&self, headers: &HeaderMap, body: &[u8]) -> AppResult<Option<WebhookEvent>> {
        if self.webhook_signature_key.is_empty() {
            tracing::warn!("SQUARE_WEBHOOK_SIGNATURE_KEY not set, rejecting webhook");
            return Err(AppError::Unauthorized);
        }
        let signature = headers
            .get("x-square-hmacsha256-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(&self.webhook_signature_key, &self.webhook_url, body, signature) {
            tracing::warn!("invalid Square signature");
            return Err(AppError::Unauthorized);
        }

        let notification: Notification = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("invalid Square notification: {e}")))?;
        if !matches!(notification.kind.as_str(), "payment.created" | "payment.updated") {
            tracing::debug!(kind = %notification.kind, "ignoring Square event");
            return Ok(None);
        }

        let payment = notification.data.object.payment;
        Ok(outcome_for(&payment, 0).map(|outcome| WebhookEvent {
            booking_id: payment.reference_id.clone(),
            payment_reference: payment.id.clone(),
            outcome,
        }))
    }
}
