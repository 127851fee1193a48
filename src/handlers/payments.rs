use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::errors::AppResult;
use crate::handlers::extract::ValidatedJson;
use crate::models::{ConfirmPaymentRequest, CreatePaymentRequest, PaymentOutcome, PaymentStatus};
use crate::services::payments;
use crate::state::AppState;

// POST /payments/create
pub async fn create(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreatePaymentRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let intent = payments::initiate(&state, &req.booking_id).await?;
    Ok(Json(intent.payload))
}

// POST /payments/confirm
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ConfirmPaymentRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let settlement =
        payments::settle_with_provider(&state, &req.booking_id, req.provider_token.trim()).await?;
    let booking = settlement.booking;

    let mut body = serde_json::json!({
        "success": booking.payment_status == PaymentStatus::Completed,
        "payment": {
            "bookingId": booking.id,
            "status": booking.payment_status,
            "reference": booking.payment_reference,
            "amount": booking.total_price,
        },
        "booking": booking,
    });
    if let Some(PaymentOutcome::Failed { reason }) = settlement.outcome {
        body["message"] = serde_json::Value::String(reason);
    }

    Ok(Json(body))
}

// POST /payments/webhook
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let booking = payments::handle_webhook(&state, &headers, &body)?;
    if let Some(booking) = &booking {
        tracing::info!(
            booking_id = %booking.id,
            payment_status = booking.payment_status.as_str(),
            "webhook applied"
        );
    }
    Ok(Json(serde_json::json!({ "received": true })))
}
