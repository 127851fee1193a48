use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::handlers::extract::ValidatedJson;
use crate::models::{CreateBookingRequest, DaySlots};
use crate::services::{availability, booking};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailableTimesQuery {
    pub date: Option<String>,
}

// GET /bookings/available-times?date=YYYY-MM-DD
pub async fn available_times(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableTimesQuery>,
) -> AppResult<Json<DaySlots>> {
    let date = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("date is required".to_string()))?;

    let db = state.db()?;
    Ok(Json(availability::get_available_slots(&db, &date)?))
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let booking = {
        let db = state.db()?;
        booking::create_booking(&db, req)?
    };
    Ok(Json(serde_json::json!({ "booking": booking })))
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let booking = {
        let db = state.db()?;
        booking::get_booking(&db, &id)?
    };
    Ok(Json(serde_json::json!({ "booking": booking })))
}
