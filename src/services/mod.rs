pub mod analytics;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod contact;
pub mod payments;

use crate::errors::{AppError, AppResult};

/// Trimmed value of a mandatory text field.
pub(crate) fn required(value: Option<String>, field: &str) -> AppResult<String> {
    non_blank(value).ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
