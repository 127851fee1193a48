pub mod admin;
pub mod availability;
pub mod booking;
pub mod contact;
pub mod payment;
pub mod service;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub use admin::{AdminPrincipal, AdminRole, Claims, LoginRequest};
pub use availability::DaySlots;
pub use booking::{
    Booking, BookingFilter, BookingPatch, BookingStatus, CreateBookingRequest, PaymentStatus,
};
pub use contact::{ContactFilter, ContactMessage, ContactPatch, ContactRequest, ContactStatus};
pub use payment::{
    ConfirmPaymentRequest, CreatePaymentRequest, PaymentIntentRef, PaymentOutcome, WebhookEvent,
};
pub use service::{Service, ServiceInput};

/// Current UTC time at the precision rows are stored with.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// Clamps the requested page/limit and returns it with the row offset.
    pub fn window(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page as i64 - 1) * limit as i64;
        (page, limit, offset)
    }

    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let pages = (total + limit as i64 - 1) / limit as i64;
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}
