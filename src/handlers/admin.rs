use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::db::queries;
use crate::errors::AppResult;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::middleware::AdminSession;
use crate::models::{
    BookingFilter, BookingPatch, ContactFilter, ContactPatch, Pagination, ServiceInput,
};
use crate::services::analytics::{self, Analytics, Dashboard};
use crate::services::{booking, catalog, contact};
use crate::state::AppState;

fn deleted() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true }))
}

// GET /admin/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BookingFilter>,
) -> AppResult<Json<serde_json::Value>> {
    let (page, limit, offset) = Pagination::window(filter.page, filter.limit);
    let (bookings, total) = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter, limit, offset)?
    };

    Ok(Json(serde_json::json!({
        "bookings": bookings,
        "pagination": Pagination::new(page, limit, total),
    })))
}

// PATCH /admin/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<BookingPatch>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = {
        let db = state.db()?;
        booking::update_booking(&db, &id, patch)?
    };
    tracing::info!(booking_id = %id, admin = %session.email, "admin patched booking");
    Ok(Json(serde_json::json!({ "booking": updated })))
}

// DELETE /admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    {
        let db = state.db()?;
        booking::delete_booking(&db, &id)?;
    }
    tracing::info!(booking_id = %id, admin = %session.email, "admin deleted booking");
    Ok(deleted())
}

// GET /admin/contacts
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ContactFilter>,
) -> AppResult<Json<serde_json::Value>> {
    let (page, limit, offset) = Pagination::window(filter.page, filter.limit);
    let (contacts, total) = {
        let db = state.db()?;
        queries::list_contacts(&db, &filter, limit, offset)?
    };

    Ok(Json(serde_json::json!({
        "contacts": contacts,
        "pagination": Pagination::new(page, limit, total),
    })))
}

// PATCH /admin/contacts/:id
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<ContactPatch>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = {
        let db = state.db()?;
        contact::update(&db, &id, patch)?
    };
    Ok(Json(serde_json::json!({ "contact": updated })))
}

// DELETE /admin/contacts/:id
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    {
        let db = state.db()?;
        contact::delete(&db, &id)?;
    }
    Ok(deleted())
}

// GET /admin/services
pub async fn list_services(State(state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    let services = {
        let db = state.db()?;
        catalog::list_all(&db)?
    };
    Ok(Json(serde_json::json!({ "services": services })))
}

// POST /admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<ServiceInput>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let service = {
        let db = state.db()?;
        catalog::create_service(&db, input)?
    };
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "service": service })),
    ))
}

// PUT /admin/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<ServiceInput>,
) -> AppResult<Json<serde_json::Value>> {
    let service = {
        let db = state.db()?;
        catalog::update_service(&db, &id, input)?
    };
    Ok(Json(serde_json::json!({ "service": service })))
}

// DELETE /admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    {
        let db = state.db()?;
        catalog::delete_service(&db, &id)?;
    }
    Ok(deleted())
}

// GET /admin/dashboard
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> AppResult<Json<Dashboard>> {
    let db = state.db()?;
    Ok(Json(analytics::dashboard(&db, Utc::now().date_naive())?))
}

// GET /admin/analytics
pub async fn get_analytics(State(state): State<Arc<AppState>>) -> AppResult<Json<Analytics>> {
    let db = state.db()?;
    Ok(Json(analytics::analytics(&db, Utc::now().date_naive())?))
}
