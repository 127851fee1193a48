use chrono::NaiveTime;
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, queries};
use crate::errors::{AppError, AppResult};
use crate::models::availability::{is_template_slot, parse_date, parse_time};
use crate::models::{self, Booking, BookingPatch, BookingStatus, CreateBookingRequest, PaymentStatus};
use crate::services::{non_blank, required};

const SLOT_TAKEN: &str = "That time slot is already booked. Please pick a different time.";

fn slot_time(raw: &str) -> AppResult<NaiveTime> {
    let time = parse_time(raw).map_err(|e| AppError::Validation(e.to_string()))?;
    if !is_template_slot(&time) {
        return Err(AppError::Validation(
            "booking_time must be an hourly slot between 09:00 and 17:00".to_string(),
        ));
    }
    Ok(time)
}

pub fn get_booking(conn: &Connection, id: &str) -> AppResult<Booking> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| AppError::NotFound("booking".to_string()))
}

/// Validates and stores a new reservation in `pending`/`confirmed` state.
///
/// The submitted `total_price` must equal the catalog rate for the requested
/// hours. The slot check and insert run under the caller's connection lock,
/// and the partial unique index rejects any confirmed duplicate that slips past.
pub fn create_booking(conn: &Connection, req: CreateBookingRequest) -> AppResult<Booking> {
    req.validate()?;

    let client_name = required(req.client_name, "client_name")?;
    let client_email = required(req.client_email, "client_email")?.to_lowercase();
    let service_type = required(req.service_type, "service_type")?;
    let booking_date = parse_date(&required(req.booking_date, "booking_date")?)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let booking_time = slot_time(&required(req.booking_time, "booking_time")?)?;
    let duration_hours = req
        .duration_hours
        .ok_or_else(|| AppError::Validation("duration_hours is required".to_string()))?;
    let total_price = req
        .total_price
        .ok_or_else(|| AppError::Validation("total_price is required".to_string()))?;

    if total_price <= Decimal::ZERO {
        return Err(AppError::Validation(
            "total_price must be greater than zero".to_string(),
        ));
    }

    let service = queries::find_active_service_by_name(conn, &service_type)?
        .ok_or_else(|| AppError::Validation(format!("unknown service: {service_type}")))?;
    let expected = service.price_for(duration_hours);
    if expected != total_price {
        return Err(AppError::Validation(format!(
            "total_price {total_price} does not match {expected} for {duration_hours}h of {}",
            service.name
        )));
    }

    if queries::slot_taken(conn, &booking_date, &booking_time, None)? {
        return Err(AppError::Conflict(SLOT_TAKEN.to_string()));
    }

    let now = models::now();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        client_name,
        client_email,
        client_phone: non_blank(req.client_phone),
        service_type: service.name,
        booking_date,
        booking_time,
        duration_hours,
        total_price,
        payment_status: PaymentStatus::Pending,
        status: BookingStatus::Confirmed,
        payment_reference: None,
        notes: non_blank(req.notes),
        created_at: now,
        updated_at: now,
    };

    match queries::create_booking(conn, &booking) {
        Ok(()) => {}
        Err(e) if db::is_unique_violation(&e) => {
            tracing::warn!(date = %booking.booking_date, time = %booking.booking_time, "lost race for slot");
            return Err(AppError::Conflict(SLOT_TAKEN.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        booking_id = %booking.id,
        date = %booking.booking_date,
        time = %booking.booking_time,
        service = %booking.service_type,
        "booking created"
    );

    Ok(booking)
}

/// Applies an admin field patch. Re-confirming into a slot held by another
/// confirmed booking is rejected.
pub fn update_booking(conn: &Connection, id: &str, patch: BookingPatch) -> AppResult<Booking> {
    patch.validate()?;
    let mut booking = get_booking(conn, id)?;

    if let Some(name) = patch.client_name {
        booking.client_name = required(Some(name), "client_name")?;
    }
    if let Some(email) = patch.client_email {
        booking.client_email = email.trim().to_lowercase();
    }
    if let Some(phone) = patch.client_phone {
        booking.client_phone = non_blank(Some(phone));
    }
    if let Some(service_type) = patch.service_type {
        booking.service_type = required(Some(service_type), "service_type")?;
    }
    if let Some(date) = patch.booking_date {
        booking.booking_date = parse_date(&date).map_err(|e| AppError::Validation(e.to_string()))?;
    }
    if let Some(time) = patch.booking_time {
        booking.booking_time = slot_time(&time)?;
    }
    if let Some(hours) = patch.duration_hours {
        booking.duration_hours = hours;
    }
    if let Some(price) = patch.total_price {
        if price < Decimal::ZERO {
            return Err(AppError::Validation(
                "total_price cannot be negative".to_string(),
            ));
        }
        booking.total_price = price;
    }
    if let Some(payment_status) = patch.payment_status {
        booking.payment_status = payment_status;
    }
    if let Some(status) = patch.status {
        booking.status = status;
    }
    if let Some(reference) = patch.payment_reference {
        booking.payment_reference = non_blank(Some(reference));
    }
    if let Some(notes) = patch.notes {
        booking.notes = non_blank(Some(notes));
    }
    booking.updated_at = models::now();

    if booking.occupies_slot()
        && queries::slot_taken(conn, &booking.booking_date, &booking.booking_time, Some(id))?
    {
        return Err(AppError::Conflict(SLOT_TAKEN.to_string()));
    }

    match queries::save_booking(conn, &booking) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::NotFound("booking".to_string())),
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::Conflict(SLOT_TAKEN.to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(booking_id = %id, "booking updated by admin");
    Ok(booking)
}

pub fn delete_booking(conn: &Connection, id: &str) -> AppResult<()> {
    if !queries::delete_booking(conn, id)? {
        return Err(AppError::NotFound("booking".to_string()));
    }
    tracing::info!(booking_id = %id, "booking deleted by admin");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn valid_request() -> CreateBookingRequest {
        CreateBookingRequest {
            client_name: Some("Ada Lovelace".into()),
            client_email: Some("Ada@Example.com".into()),
            client_phone: Some("  ".into()),
            service_type: Some("Podcast Recording".into()),
            booking_date: Some("2025-06-01".into()),
            booking_time: Some("10:00".into()),
            duration_hours: Some(2),
            total_price: Some(Decimal::from(300)),
            notes: Some("Two guests".into()),
        }
    }

    #[test]
    fn test_create_booking_defaults() {
        let conn = setup_db();
        let booking = create_booking(&conn, valid_request()).unwrap();

        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_price, Decimal::from(300));
        assert_eq!(booking.client_email, "ada@example.com");
        assert_eq!(booking.client_phone, None);
        assert_eq!(booking.notes.as_deref(), Some("Two guests"));

        let stored = get_booking(&conn, &booking.id).unwrap();
        assert_eq!(stored, booking);
    }

    #[test]
    fn test_accepts_seconds_in_time() {
        let conn = setup_db();
        let mut req = valid_request();
        req.booking_time = Some("11:00:00".into());
        let booking = create_booking(&conn, req).unwrap();
        assert_eq!(booking.booking_time, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_email_rejected() {
        let conn = setup_db();
        let mut req = valid_request();
        req.client_email = None;
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(_)));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let conn = setup_db();
        let mut req = valid_request();
        req.client_email = Some("not-an-email".into());
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(_)));
    }

    #[test]
    fn test_blank_name_rejected() {
        let conn = setup_db();
        let mut req = valid_request();
        req.client_name = Some("   ".into());
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_off_template_time_rejected() {
        let conn = setup_db();
        for time in ["08:00", "18:00", "10:30"] {
            let mut req = valid_request();
            req.booking_time = Some(time.into());
            let err = create_booking(&conn, req).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{time} accepted");
        }
    }

    #[test]
    fn test_price_mismatch_rejected() {
        let conn = setup_db();
        let mut req = valid_request();
        req.total_price = Some(Decimal::from(1));
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unknown_service_rejected() {
        let conn = setup_db();
        let mut req = valid_request();
        req.service_type = Some("Karaoke Night".into());
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_same_slot_twice_conflicts() {
        let conn = setup_db();
        create_booking(&conn, valid_request()).unwrap();

        let mut second = valid_request();
        second.client_email = Some("grace@example.com".into());
        let err = create_booking(&conn, second).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_patch_updates_fields() {
        let conn = setup_db();
        let booking = create_booking(&conn, valid_request()).unwrap();

        let patch = BookingPatch {
            notes: Some("Bring headphones".into()),
            booking_time: Some("14:00".into()),
            payment_status: Some(PaymentStatus::Completed),
            ..Default::default()
        };
        let updated = update_booking(&conn, &booking.id, patch).unwrap();
        assert_eq!(updated.notes.as_deref(), Some("Bring headphones"));
        assert_eq!(updated.booking_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(updated.payment_status, PaymentStatus::Completed);
        assert_eq!(get_booking(&conn, &booking.id).unwrap(), updated);
    }

    #[test]
    fn test_patch_into_taken_slot_conflicts() {
        let conn = setup_db();
        create_booking(&conn, valid_request()).unwrap();
        let mut other = valid_request();
        other.booking_time = Some("12:00".into());
        let other = create_booking(&conn, other).unwrap();

        let patch = BookingPatch {
            booking_time: Some("10:00".into()),
            ..Default::default()
        };
        let err = update_booking(&conn, &other.id, patch).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_patch_unknown_booking() {
        let conn = setup_db();
        let err = update_booking(&conn, "nope", BookingPatch::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_delete_booking() {
        let conn = setup_db();
        let booking = create_booking(&conn, valid_request()).unwrap();
        delete_booking(&conn, &booking.id).unwrap();
        assert!(matches!(
            delete_booking(&conn, &booking.id).unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
