use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Terminal result of a charge, as reported by whichever provider ran it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded { reference: String, amount: Decimal },
    Failed { reason: String },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded { .. })
    }
}

/// Provider-specific handle the client needs to complete a charge.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRef {
    /// Identifier to persist on the booking, when the provider issues one up front.
    pub reference: Option<String>,
    /// Body returned verbatim to the client.
    pub payload: serde_json::Value,
}

/// A verified provider notification. `booking_id` comes from the metadata
/// the provider echoes back; when absent the booking is found through
/// `payment_reference`.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub booking_id: Option<String>,
    pub payment_reference: String,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "bookingId is required"))]
    pub booking_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, message = "bookingId is required"))]
    pub booking_id: String,
    #[validate(length(min = 1, message = "providerToken is required"))]
    #[serde(alias = "paymentIntentId", alias = "cardNonce")]
    pub provider_token: String,
}

/// Converts a major-unit amount (dollars) to minor units (cents).
pub fn to_minor_units(amount: Decimal) -> anyhow::Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| anyhow::anyhow!("amount out of range: {amount}"))
}

pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}
