use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::availability::hhmm;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub service_type: String,
    pub booking_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub booking_time: NaiveTime,
    pub duration_hours: u32,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// Only confirmed bookings hold their slot.
    pub fn occupies_slot(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn description(&self) -> String {
        format!(
            "{} - {} at {}",
            self.service_type,
            self.booking_date.format("%Y-%m-%d"),
            self.booking_time.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

/// Body of `POST /bookings`. Every field is optional at the serde level so a
/// missing field surfaces as a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(
        required(message = "client_name is required"),
        length(min = 1, message = "client_name is required")
    )]
    pub client_name: Option<String>,
    #[validate(
        required(message = "client_email is required"),
        email(message = "client_email must be a valid email address")
    )]
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[validate(
        required(message = "service_type is required"),
        length(min = 1, message = "service_type is required")
    )]
    pub service_type: Option<String>,
    #[validate(required(message = "booking_date is required"))]
    pub booking_date: Option<String>,
    #[validate(required(message = "booking_time is required"))]
    pub booking_time: Option<String>,
    #[validate(
        required(message = "duration_hours is required"),
        range(min = 1, max = 24, message = "duration_hours must be between 1 and 24")
    )]
    pub duration_hours: Option<u32>,
    #[validate(required(message = "total_price is required"))]
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}

/// Admin field patch. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookingPatch {
    #[validate(length(min = 1, message = "client_name cannot be empty"))]
    pub client_name: Option<String>,
    #[validate(email(message = "client_email must be a valid email address"))]
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[validate(length(min = 1, message = "service_type cannot be empty"))]
    pub service_type: Option<String>,
    pub booking_date: Option<String>,
    pub booking_time: Option<String>,
    #[validate(range(min = 1, max = 24, message = "duration_hours must be between 1 and 24"))]
    pub duration_hours: Option<u32>,
    pub total_price: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<BookingStatus>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    /// Free-text match against client name, email and service.
    pub q: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<BookingStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for s in ["pending", "completed", "failed"] {
            assert_eq!(PaymentStatus::parse(s).unwrap().as_str(), s);
        }
        for s in ["confirmed", "cancelled", "completed"] {
            assert_eq!(BookingStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(PaymentStatus::parse("refunded").is_none());
        assert!(BookingStatus::parse("pending").is_none());
    }

    #[test]
    fn test_terminal_payment_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_missing_email_fails_validation() {
        let req = CreateBookingRequest {
            client_name: Some("Ada".into()),
            service_type: Some("Podcast Recording".into()),
            booking_date: Some("2025-06-01".into()),
            booking_time: Some("10:00".into()),
            duration_hours: Some(2),
            total_price: Some(Decimal::from(300)),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("client_email"));
    }

    #[test]
    fn test_malformed_email_fails_validation() {
        let req = CreateBookingRequest {
            client_name: Some("Ada".into()),
            client_email: Some("not-an-email".into()),
            service_type: Some("Podcast Recording".into()),
            booking_date: Some("2025-06-01".into()),
            booking_time: Some("10:00".into()),
            duration_hours: Some(2),
            total_price: Some(Decimal::from(300)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_booking_serializes_slot_as_hhmm() {
        let now = chrono::Utc::now().naive_utc();
        let booking = Booking {
            id: "b1".into(),
            client_name: "Ada".into(),
            client_email: "ada@example.com".into(),
            client_phone: None,
            service_type: "Podcast Recording".into(),
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            booking_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration_hours: 2,
            total_price: Decimal::from(300),
            payment_status: PaymentStatus::Pending,
            status: BookingStatus::Confirmed,
            payment_reference: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["booking_time"], "10:00");
        assert_eq!(json["booking_date"], "2025-06-01");
        assert_eq!(json["payment_status"], "pending");
        assert_eq!(json["total_price"], 300.0);
        assert_eq!(booking.description(), "Podcast Recording - 2025-06-01 at 10:00");
    }
}
