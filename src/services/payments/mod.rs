pub mod square;
pub mod stripe;

use async_trait::async_trait;
use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::errors::{AppError, AppResult};
use crate::models::payment::to_minor_units;
use crate::models::{Booking, BookingStatus, PaymentIntentRef, PaymentOutcome, PaymentStatus, WebhookEvent};
use crate::state::AppState;

/// A card processor the studio charges through. Adapters map provider
/// payloads into [`PaymentOutcome`] and never touch the reservation store.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Prepares a charge for `amount_minor` and returns what the client needs
    /// to complete it.
    async fn create_intent(&self, booking: &Booking, amount_minor: i64)
        -> anyhow::Result<PaymentIntentRef>;

    /// Resolves the client's token into a terminal outcome, or `None` while
    /// the provider still reports the charge in flight.
    async fn settle(
        &self,
        booking: &Booking,
        provider_token: &str,
        amount_minor: i64,
    ) -> anyhow::Result<Option<PaymentOutcome>>;

    /// Verifies and decodes a provider notification. `Ok(None)` for events
    /// that carry no terminal outcome.
    fn parse_webhook(&self, headers: &HeaderMap, body: &[u8]) -> AppResult<Option<WebhookEvent>>;
}

#[derive(Debug)]
pub struct Settlement {
    pub booking: Booking,
    pub outcome: Option<PaymentOutcome>,
}

fn load(conn: &Connection, booking_id: &str) -> AppResult<Booking> {
    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))
}

fn awaiting_payment(booking: &Booking) -> AppResult<()> {
    if booking.payment_status.is_terminal() || !booking.occupies_slot() {
        return Err(AppError::Conflict(
            "booking is not awaiting payment".to_string(),
        ));
    }
    Ok(())
}

/// Starts a charge for the booking's `total_price`. The booking's payment
/// state is left untouched; only the provider reference is recorded.
pub async fn initiate(state: &AppState, booking_id: &str) -> AppResult<PaymentIntentRef> {
    let booking = {
        let db = state.db()?;
        load(&db, booking_id)?
    };
    awaiting_payment(&booking)?;

    let amount = to_minor_units(booking.total_price)?;
    let intent = state
        .payments
        .create_intent(&booking, amount)
        .await
        .map_err(|e| AppError::Payment(format!("{e:#}")))?;

    if let Some(reference) = &intent.reference {
        let db = state.db()?;
        queries::set_payment_reference(&db, &booking.id, reference)?;
    }

    tracing::info!(
        booking_id = %booking.id,
        provider = state.payments.name(),
        amount_minor = amount,
        "payment initiated"
    );
    Ok(intent)
}

/// Reference of a charge that was captured after its booking had already
/// failed. The booking stays cancelled, so the charge needs a manual refund.
fn unreconciled_charge<'a>(booking: &Booking, outcome: &'a PaymentOutcome) -> Option<&'a str> {
    match outcome {
        PaymentOutcome::Succeeded { reference, .. }
            if booking.payment_status == PaymentStatus::Failed =>
        {
            Some(reference.as_str())
        }
        _ => None,
    }
}

/// Applies a terminal outcome. Once the payment has left `pending` further
/// calls return the stored booking unchanged.
pub fn confirm(conn: &Connection, booking_id: &str, outcome: &PaymentOutcome) -> AppResult<Booking> {
    let booking = load(conn, booking_id)?;
    if booking.payment_status.is_terminal() {
        if let Some(reference) = unreconciled_charge(&booking, outcome) {
            tracing::error!(
                booking_id = %booking_id,
                reference = %reference,
                "payment captured for a failed booking, reconcile manually"
            );
        } else {
            tracing::debug!(booking_id = %booking_id, "payment already settled");
        }
        return Ok(booking);
    }

    let updated = match outcome {
        PaymentOutcome::Succeeded { reference, amount } => {
            if *amount != booking.total_price {
                tracing::warn!(
                    booking_id = %booking_id,
                    paid = %amount,
                    expected = %booking.total_price,
                    "paid amount differs from booking total"
                );
            }
            queries::settle_payment(
                conn,
                booking_id,
                PaymentStatus::Completed,
                BookingStatus::Confirmed,
                Some(reference.as_str()),
            )
        }
        PaymentOutcome::Failed { reason } => {
            tracing::info!(booking_id = %booking_id, reason = %reason, "payment failed, releasing slot");
            queries::settle_payment(
                conn,
                booking_id,
                PaymentStatus::Failed,
                BookingStatus::Cancelled,
                None,
            )
        }
    };

    match updated {
        Ok(true) => {
            tracing::info!(booking_id = %booking_id, success = outcome.is_success(), "payment settled");
        }
        Ok(false) => {}
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::Conflict(
                "slot was taken by another booking".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    }

    load(conn, booking_id)
}

/// Asks the provider to resolve `provider_token` and records the result.
/// A booking that is already settled is returned as is without contacting
/// the provider.
pub async fn settle_with_provider(
    state: &AppState,
    booking_id: &str,
    provider_token: &str,
) -> AppResult<Settlement> {
    let booking = {
        let db = state.db()?;
        load(&db, booking_id)?
    };
    if booking.payment_status.is_terminal() {
        return Ok(Settlement {
            booking,
            outcome: None,
        });
    }
    awaiting_payment(&booking)?;

    if let Some(reference) = &booking.payment_reference {
        if reference != provider_token {
            return Err(AppError::Validation(
                "payment does not belong to this booking".to_string(),
            ));
        }
    }

    let amount = to_minor_units(booking.total_price)?;
    let outcome = state
        .payments
        .settle(&booking, provider_token, amount)
        .await
        .map_err(|e| AppError::Payment(format!("{e:#}")))?;

    let Some(outcome) = outcome else {
        tracing::info!(booking_id = %booking_id, "payment still in flight");
        return Ok(Settlement {
            booking,
            outcome: None,
        });
    };

    let db = state.db()?;
    let booking = confirm(&db, booking_id, &outcome)?;
    Ok(Settlement {
        booking,
        outcome: Some(outcome),
    })
}

/// Applies a verified provider notification. Events for unknown bookings are
/// acknowledged and dropped so the provider stops retrying.
pub fn handle_webhook(state: &AppState, headers: &HeaderMap, body: &[u8]) -> AppResult<Option<Booking>> {
    let Some(event) = state.payments.parse_webhook(headers, body)? else {
        return Ok(None);
    };

    let db = state.db()?;
    let booking_id = match event.booking_id {
        Some(id) => id,
        None => match queries::get_booking_by_reference(&db, &event.payment_reference)? {
            Some(booking) => booking.id,
            None => {
                tracing::warn!(reference = %event.payment_reference, "webhook for unknown payment");
                return Ok(None);
            }
        },
    };

    match confirm(&db, &booking_id, &event.outcome) {
        Ok(booking) => Ok(Some(booking)),
        Err(AppError::NotFound(_)) => {
            tracing::warn!(booking_id = %booking_id, "webhook for unknown booking");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
