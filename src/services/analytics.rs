use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{Booking, ContactStatus};

const RECENT_BOOKINGS: i64 = 5;
const POPULAR_SERVICES: i64 = 5;
const TREND_MONTHS: u32 = 6;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub pending_bookings: i64,
    pub completed_bookings: i64,
    pub total_contacts: i64,
    pub new_contacts: i64,
    pub upcoming_bookings: i64,
    pub recent_bookings: Vec<Booking>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ServiceCount {
    pub service: String,
    pub count: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthTrend {
    /// e.g. `Jun 2025`
    pub month: String,
    pub bookings: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub monthly_bookings: i64,
    pub monthly_revenue: Decimal,
    pub popular_services: Vec<ServiceCount>,
    pub booking_trends: Vec<MonthTrend>,
}

/// Headline counters for the admin landing page. Revenue counts only
/// completed payments.
pub fn dashboard(conn: &Connection, today: NaiveDate) -> AppResult<Dashboard> {
    let stats = queries::booking_stats(conn, &today)?;

    Ok(Dashboard {
        total_bookings: stats.total,
        total_revenue: stats.revenue,
        pending_bookings: stats.pending,
        completed_bookings: stats.completed,
        total_contacts: queries::count_contacts(conn, None)?,
        new_contacts: queries::count_contacts(conn, Some(ContactStatus::New))?,
        upcoming_bookings: stats.upcoming,
        recent_bookings: queries::recent_bookings(conn, RECENT_BOOKINGS)?,
    })
}

/// Booking volume and revenue, bucketed by the month the booking was made.
pub fn analytics(conn: &Connection, today: NaiveDate) -> AppResult<Analytics> {
    let stats = queries::booking_stats(conn, &today)?;

    let first_of_month = today.with_day(1).unwrap_or(today);
    let window: Vec<NaiveDate> = (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| first_of_month.checked_sub_months(Months::new(back)))
        .collect();
    let since = window.first().copied().unwrap_or(first_of_month);

    let activity: HashMap<String, queries::MonthActivity> = queries::monthly_activity(conn, &since)?
        .into_iter()
        .map(|m| (m.month.clone(), m))
        .collect();

    let booking_trends: Vec<MonthTrend> = window
        .iter()
        .map(|month| {
            let found = activity.get(&month.format("%Y-%m").to_string());
            MonthTrend {
                month: month.format("%b %Y").to_string(),
                bookings: found.map(|m| m.bookings).unwrap_or(0),
                revenue: found.map(|m| m.revenue).unwrap_or(Decimal::ZERO),
            }
        })
        .collect();

    let (monthly_bookings, monthly_revenue) = booking_trends
        .last()
        .map(|t| (t.bookings, t.revenue))
        .unwrap_or((0, Decimal::ZERO));

    let popular_services = queries::popular_services(conn, POPULAR_SERVICES)?
        .into_iter()
        .map(|(service, count)| ServiceCount { service, count })
        .collect();

    Ok(Analytics {
        total_bookings: stats.total,
        total_revenue: stats.revenue,
        monthly_bookings,
        monthly_revenue,
        popular_services,
        booking_trends,
    })
}
