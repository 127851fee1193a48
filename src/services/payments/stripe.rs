use anyhow::Context;
use async_trait::async_trait;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::PaymentProvider;
use crate::errors::{AppError, AppResult};
use crate::models::payment::from_minor_units;
use crate::models::{Booking, PaymentIntentRef, PaymentOutcome, WebhookEvent};

const API_BASE: &str = "https://api.stripe.com/v1";
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeProvider {
    secret_key: String,
    webhook_secret: String,
    currency: String,
    client: reqwest::Client,
}

impl StripeProvider {
    pub fn new(secret_key: String, webhook_secret: String, currency: String) -> Self {
        Self {
            secret_key,
            webhook_secret,
            currency,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
    client_secret: Option<String>,
    #[serde(default)]
    amount_received: i64,
    #[serde(default)]
    metadata: Metadata,
    last_payment_error: Option<PaymentError>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(rename = "bookingId")]
    booking_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: PaymentIntent,
}

fn failure_reason(intent: &PaymentIntent) -> String {
    intent
        .last_payment_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| format!("payment intent {}", intent.status))
}

/// Terminal outcome for an intent, `None` while it is still in progress.
fn outcome_for(intent: &PaymentIntent) -> Option<PaymentOutcome> {
    match intent.status.as_str() {
        "succeeded" => Some(PaymentOutcome::Succeeded {
            reference: intent.id.clone(),
            amount: from_minor_units(intent.amount_received),
        }),
        "canceled" => Some(PaymentOutcome::Failed {
            reason: failure_reason(intent),
        }),
        // A declined card leaves the intent open for another attempt
        _ => None,
    }
}

/// Checks a `Stripe-Signature` header (`t=<ts>,v1=<hex>[,v1=...]`) against
/// the raw payload.
pub fn verify_signature(secret: &str, header: &str, payload: &[u8], now_ts: i64) -> bool {
    let mut timestamp: Option<i64> = None;
    let mut signatures = vec![];
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse().ok(),
            Some(("v1", v)) => signatures.push(v),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    if (now_ts - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    signatures.into_iter().any(|sig| {
        let Ok(expected) = hex::decode(sig) else {
            return false;
        };
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    })
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_intent(
        &self,
        booking: &Booking,
        amount_minor: i64,
    ) -> anyhow::Result<PaymentIntentRef> {
        let amount = amount_minor.to_string();
        let description = booking.description();
        let intent: PaymentIntent = self
            .client
            .post(format!("{API_BASE}/payment_intents"))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", self.currency.as_str()),
                ("automatic_payment_methods[enabled]", "true"),
                ("description", description.as_str()),
                ("receipt_email", booking.client_email.as_str()),
                ("metadata[bookingId]", booking.id.as_str()),
                ("metadata[clientName]", booking.client_name.as_str()),
                ("metadata[clientEmail]", booking.client_email.as_str()),
                ("metadata[serviceType]", booking.service_type.as_str()),
            ])
            .send()
            .await
            .context("failed to reach Stripe")?
            .error_for_status()
            .context("Stripe rejected payment intent")?
            .json()
            .await
            .context("invalid payment intent response")?;

        let client_secret = intent
            .client_secret
            .context("payment intent has no client secret")?;

        Ok(PaymentIntentRef {
            reference: Some(intent.id.clone()),
            payload: serde_json::json!({
                "clientSecret": client_secret,
                "paymentIntentId": intent.id,
            }),
        })
    }

    async fn settle(
        &self,
        booking: &Booking,
        provider_token: &str,
        _amount_minor: i64,
    ) -> anyhow::Result<Option<PaymentOutcome>> {
        let intent: PaymentIntent = self
            .client
            .get(format!("{API_BASE}/payment_intents/{provider_token}"))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .context("failed to reach Stripe")?
            .error_for_status()
            .context("Stripe rejected payment intent lookup")?
            .json()
            .await
            .context("invalid payment intent response")?;

        anyhow::ensure!(
            intent.metadata.booking_id.as_deref() == Some(booking.id.as_str()),
            "payment intent {} belongs to another booking",
            intent.id
        );

        Ok(outcome_for(&intent))
    }

    fn parse_webhook(&self, headers: &HeaderMap, body: &[u8]) -> AppResult<Option<WebhookEvent>> {
        if self.webhook_secret.is_empty() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set, rejecting webhook");
            return Err(AppError::Unauthorized);
        }
        let header = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let now = chrono::Utc::now().timestamp();
        if !verify_signature(&self.webhook_secret, header, body, now) {
            tracing::warn!("invalid Stripe signature");
            return Err(AppError::Unauthorized);
        }

        let event: Event = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("invalid Stripe event: {e}")))?;
        if !matches!(
            event.kind.as_str(),
            "payment_intent.succeeded" | "payment_intent.payment_failed" | "payment_intent.canceled"
        ) {
            tracing::debug!(kind = %event.kind, "ignoring Stripe event");
            return Ok(None);
        }

        let intent = event.data.object;
        let Some(outcome) = outcome_for(&intent) else {
            tracing::info!(
                intent = %intent.id,
                reason = %failure_reason(&intent),
                "Stripe payment attempt failed, intent still open"
            );
            return Ok(None);
        };

        Ok(Some(WebhookEvent {
            booking_id: intent.metadata.booking_id.clone(),
            payment_reference: intent.id,
            outcome,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sign(secret: &str, ts: i64, payload: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn provider() -> StripeProvider {
        StripeProvider::new("sk_test".into(), "whsec_test".into(), "usd".into())
    }

    fn event(kind: &str, status: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": kind,
            "data": {"object": {
                "id": "pi_1",
                "status": status,
                "amount_received": 30000,
                "metadata": {"bookingId": "b-1"},
                "last_payment_error": null
            }}
        }))
        .unwrap()
    }

    fn signed_headers(body: &[u8]) -> HeaderMap {
        let now = chrono::Utc::now().timestamp();
        let mut headers = HeaderMap::new();
        headers.insert("stripe-signature", sign("whsec_test", now, body).parse().unwrap());
        headers
    }

    #[test]
    fn test_signature_accepts_valid() {
        let header = sign("whsec_test", 1_700_000_000, b"{}");
        assert!(verify_signature("whsec_test", &header, b"{}", 1_700_000_100));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let header = sign("whsec_test", 1_700_000_000, b"{}");
        assert!(!verify_signature("whsec_test", &header, b"{ }", 1_700_000_000));
        assert!(!verify_signature("other", &header, b"{}", 1_700_000_000));
        assert!(!verify_signature("whsec_test", "v1=abc", b"{}", 1_700_000_000));
    }

    #[test]
    fn test_signature_rejects_stale_timestamp() {
        let header = sign("whsec_test", 1_700_000_000, b"{}");
        assert!(!verify_signature("whsec_test", &header, b"{}", 1_700_000_301));
    }

    #[test]
    fn test_webhook_succeeded() {
        let body = event("payment_intent.succeeded", "succeeded");
        let parsed = provider()
            .parse_webhook(&signed_headers(&body), &body)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.booking_id.as_deref(), Some("b-1"));
        assert_eq!(
            parsed.outcome,
            PaymentOutcome::Succeeded {
                reference: "pi_1".into(),
                amount: Decimal::from(300),
            }
        );
    }

    fn intent(status: &str, error: Option<&str>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            status: status.into(),
            client_secret: None,
            amount_received: 0,
            metadata: Metadata::default(),
            last_payment_error: error.map(|m| PaymentError {
                message: Some(m.into()),
            }),
        }
    }

    #[test]
    fn test_declined_card_is_retryable() {
        let declined = intent("requires_payment_method", Some("Your card was declined."));
        assert_eq!(outcome_for(&declined), None);
        assert_eq!(outcome_for(&intent("processing", None)), None);
    }

    #[test]
    fn test_canceled_intent_fails() {
        assert_eq!(
            outcome_for(&intent("canceled", None)),
            Some(PaymentOutcome::Failed {
                reason: "payment intent canceled".into(),
            })
        );
    }

    #[test]
    fn test_webhook_payment_failed_keeps_booking_open() {
        let body = event("payment_intent.payment_failed", "requires_payment_method");
        assert!(provider()
            .parse_webhook(&signed_headers(&body), &body)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_webhook_canceled() {
        let body = event("payment_intent.canceled", "canceled");
        let parsed = provider()
            .parse_webhook(&signed_headers(&body), &body)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.payment_reference, "pi_1");
        assert!(!parsed.outcome.is_success());
    }

    #[test]
    fn test_webhook_without_booking_id_keeps_reference() {
        let body = serde_json::to_vec(&serde_json::json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {
                "id": "pi_9",
                "status": "succeeded",
                "amount_received": 30000
            }}
        }))
        .unwrap();
        let parsed = provider()
            .parse_webhook(&signed_headers(&body), &body)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.booking_id, None);
        assert_eq!(parsed.payment_reference, "pi_9");
    }

    #[test]
    fn test_webhook_ignores_other_events() {
        let body = event("payment_intent.created", "requires_payment_method");
        assert!(provider()
            .parse_webhook(&signed_headers(&body), &body)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_webhook_without_signature_rejected() {
        let body = event("payment_intent.succeeded", "succeeded");
        assert!(matches!(
            provider().parse_webhook(&HeaderMap::new(), &body).unwrap_err(),
            AppError::Unauthorized
        ));
    }
}
