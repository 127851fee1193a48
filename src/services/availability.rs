use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::availability::parse_date;
use crate::models::DaySlots;

/// Free and reserved template slots for `date` (`YYYY-MM-DD`). Past dates are
/// answered like any other.
pub fn get_available_slots(conn: &Connection, date: &str) -> AppResult<DaySlots> {
    let date = parse_date(date).map_err(|e| AppError::Validation(e.to_string()))?;
    let reserved = queries::reserved_times(conn, &date)?;
    Ok(DaySlots::partition(&reserved))
}
