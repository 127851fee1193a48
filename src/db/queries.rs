use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::availability::{format_slot, parse_time};
use crate::models::payment::from_minor_units;
use crate::models::{
    AdminPrincipal, AdminRole, Booking, BookingFilter, BookingStatus, ContactFilter,
    ContactMessage, ContactStatus, PaymentStatus, Service, ServiceInput,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).with_context(|| format!("bad timestamp: {s}"))
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("bad decimal: {s}"))
}

fn like_pattern(q: &str) -> String {
    format!("%{}%", q.trim())
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, name, description, price_per_hour, duration_hours, features, is_active, created_at";

pub fn list_services(conn: &Connection, active_only: bool) -> anyhow::Result<Vec<Service>> {
    let sql = if active_only {
        format!("SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 ORDER BY name ASC")
    } else {
        format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY name ASC")
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_service_row(row)))
        .optional()?;
    result.transpose()
}

/// Active catalog entry whose name matches `name`, ignoring case.
pub fn find_active_service_by_name(
    conn: &Connection,
    name: &str,
) -> anyhow::Result<Option<Service>> {
    let sql = format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 AND lower(name) = lower(?1) LIMIT 1"
    );
    let result = conn
        .query_row(&sql, params![name.trim()], |row| Ok(parse_service_row(row)))
        .optional()?;
    result.transpose()
}

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    let features = serde_json::to_string(&service.features)?;
    conn.execute(
        "INSERT INTO services (id, name, description, price_per_hour, duration_hours, features, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            service.id,
            service.name,
            service.description,
            service.price_per_hour.to_string(),
            service.duration_hours,
            features,
            service.is_active as i32,
            format_ts(&service.created_at),
        ],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, id: &str, input: &ServiceInput) -> anyhow::Result<bool> {
    let features = serde_json::to_string(&input.features)?;
    let now = format_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, price_per_hour = ?3, duration_hours = ?4,
             features = ?5, is_active = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            input.name,
            input.description,
            input.price_per_hour.to_string(),
            input.duration_hours,
            features,
            input.is_active as i32,
            now,
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let price_str: String = row.get(3)?;
    let features_json: String = row.get(5)?;
    let created_at_str: String = row.get(7)?;

    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_per_hour: parse_decimal(&price_str)?,
        duration_hours: row.get(4)?,
        features: serde_json::from_str(&features_json).unwrap_or_default(),
        is_active: row.get::<_, i32>(6)? != 0,
        created_at: parse_ts(&created_at_str)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, client_name, client_email, client_phone, service_type, booking_date, booking_time, \
     duration_hours, total_price, payment_status, status, payment_reference, notes, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, client_name, client_email, client_phone, service_type, booking_date, booking_time,
             duration_hours, total_price, payment_status, status, payment_reference, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            booking.id,
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.service_type,
            booking.booking_date.format("%Y-%m-%d").to_string(),
            format_slot(&booking.booking_time),
            booking.duration_hours,
            booking.total_price.to_string(),
            booking.payment_status.as_str(),
            booking.status.as_str(),
            booking.payment_reference,
            booking.notes,
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Writes every mutable column of `booking` back to its row.
pub fn save_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET client_name = ?1, client_email = ?2, client_phone = ?3, service_type = ?4,
             booking_date = ?5, booking_time = ?6, duration_hours = ?7, total_price = ?8,
             payment_status = ?9, status = ?10, payment_reference = ?11, notes = ?12, updated_at = ?13
         WHERE id = ?14",
        params![
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.service_type,
            booking.booking_date.format("%Y-%m-%d").to_string(),
            format_slot(&booking.booking_time),
            booking.duration_hours,
            booking.total_price.to_string(),
            booking.payment_status.as_str(),
            booking.status.as_str(),
            booking.payment_reference,
            booking.notes,
            format_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;
    result.transpose()
}

pub fn get_booking_by_reference(
    conn: &Connection,
    reference: &str,
) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_reference = ?1 LIMIT 1");
    let result = conn
        .query_row(&sql, params![reference], |row| Ok(parse_booking_row(row)))
        .optional()?;
    result.transpose()
}

/// Slot start times held by confirmed bookings on `date`.
pub fn reserved_times(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<NaiveTime>> {
    let mut stmt = conn.prepare(
        "SELECT booking_time FROM bookings
         WHERE booking_date = ?1 AND status = 'confirmed' ORDER BY booking_time ASC",
    )?;
    let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut times = vec![];
    for row in rows {
        times.push(parse_time(&row?)?);
    }
    Ok(times)
}

/// Whether a confirmed booking other than `exclude_id` holds the slot.
pub fn slot_taken(
    conn: &Connection,
    date: &NaiveDate,
    time: &NaiveTime,
    exclude_id: Option<&str>,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE booking_date = ?1 AND booking_time = ?2 AND status = 'confirmed'
           AND (?3 IS NULL OR id != ?3)",
        params![
            date.format("%Y-%m-%d").to_string(),
            format_slot(time),
            exclude_id
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Moves a pending booking to its terminal payment state. Returns `false`
/// when the booking is missing or no longer pending.
pub fn settle_payment(
    conn: &Connection,
    id: &str,
    payment_status: PaymentStatus,
    status: BookingStatus,
    reference: Option<&str>,
) -> anyhow::Result<bool> {
    let now = format_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, status = ?2,
             payment_reference = COALESCE(?3, payment_reference), updated_at = ?4
         WHERE id = ?5 AND payment_status = 'pending'",
        params![payment_status.as_str(), status.as_str(), reference, now, id],
    )?;
    Ok(count > 0)
}

pub fn set_payment_reference(conn: &Connection, id: &str, reference: &str) -> anyhow::Result<bool> {
    let now = format_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_reference = ?1, updated_at = ?2 WHERE id = ?3",
        params![reference, now, id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Filtered, newest-first page of bookings plus the unpaged match count.
pub fn list_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    limit: u32,
    offset: i64,
) -> anyhow::Result<(Vec<Booking>, i64)> {
    let mut clauses: Vec<String> = vec![];
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        params_vec.push(Box::new(like_pattern(q)));
        let n = params_vec.len();
        clauses.push(format!(
            "(client_name LIKE ?{n} OR client_email LIKE ?{n} OR service_type LIKE ?{n})"
        ));
    }
    if let Some(payment_status) = filter.payment_status {
        params_vec.push(Box::new(payment_status.as_str()));
        clauses.push(format!("payment_status = ?{}", params_vec.len()));
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", params_vec.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings {where_sql}"),
        params_refs.as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT {limit} OFFSET {offset}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok((bookings, total))
}

pub fn recent_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

// ── Reporting ──

/// Whole cents of `total_price`. Stored prices carry at most two decimals.
const PRICE_CENTS: &str = "CAST(ROUND(CAST(total_price AS REAL) * 100) AS INTEGER)";

pub struct BookingStats {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub upcoming: i64,
    pub revenue: Decimal,
}

/// Headline booking counters. `upcoming` counts confirmed bookings dated
/// `today` or later; revenue sums completed payments only.
pub fn booking_stats(conn: &Connection, today: &NaiveDate) -> anyhow::Result<BookingStats> {
    let sql = format!(
        "SELECT COUNT(*),
                COALESCE(SUM(payment_status = 'pending'), 0),
                COALESCE(SUM(payment_status = 'completed'), 0),
                COALESCE(SUM(status = 'confirmed' AND booking_date >= ?1), 0),
                COALESCE(SUM(CASE WHEN payment_status = 'completed' THEN {PRICE_CENTS} END), 0)
         FROM bookings"
    );
    let stats = conn.query_row(&sql, params![today.format("%Y-%m-%d").to_string()], |row| {
        Ok(BookingStats {
            total: row.get(0)?,
            pending: row.get(1)?,
            completed: row.get(2)?,
            upcoming: row.get(3)?,
            revenue: from_minor_units(row.get(4)?),
        })
    })?;
    Ok(stats)
}

pub struct MonthActivity {
    /// `YYYY-MM`
    pub month: String,
    pub bookings: i64,
    pub revenue: Decimal,
}

/// Bookings made per calendar month since `since`, with completed revenue.
/// Months without bookings are absent.
pub fn monthly_activity(conn: &Connection, since: &NaiveDate) -> anyhow::Result<Vec<MonthActivity>> {
    let sql = format!(
        "SELECT substr(created_at, 1, 7) AS month, COUNT(*),
                COALESCE(SUM(CASE WHEN payment_status = 'completed' THEN {PRICE_CENTS} END), 0)
         FROM bookings
         WHERE created_at >= ?1
         GROUP BY month
         ORDER BY month ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![since.format("%Y-%m-%d").to_string()], |row| {
        Ok(MonthActivity {
            month: row.get(0)?,
            bookings: row.get(1)?,
            revenue: from_minor_units(row.get(2)?),
        })
    })?;

    let mut months = vec![];
    for row in rows {
        months.push(row?);
    }
    Ok(months)
}

/// Booking counts per `service_type`, most booked first.
pub fn popular_services(conn: &Connection, limit: i64) -> anyhow::Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT service_type, COUNT(*) AS n FROM bookings
         GROUP BY service_type
         ORDER BY n DESC, service_type ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut counts = vec![];
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_date_str: String = row.get(5)?;
    let booking_time_str: String = row.get(6)?;
    let total_price_str: String = row.get(8)?;
    let payment_status_str: String = row.get(9)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    Ok(Booking {
        id: row.get(0)?,
        client_name: row.get(1)?,
        client_email: row.get(2)?,
        client_phone: row.get(3)?,
        service_type: row.get(4)?,
        booking_date: NaiveDate::parse_from_str(&booking_date_str, "%Y-%m-%d")
            .with_context(|| format!("bad booking_date: {booking_date_str}"))?,
        booking_time: parse_time(&booking_time_str)?,
        duration_hours: row.get(7)?,
        total_price: parse_decimal(&total_price_str)?,
        payment_status: PaymentStatus::parse(&payment_status_str)
            .with_context(|| format!("bad payment_status: {payment_status_str}"))?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("bad status: {status_str}"))?,
        payment_reference: row.get(11)?,
        notes: row.get(12)?,
        created_at: parse_ts(&created_at_str)?,
        updated_at: parse_ts(&updated_at_str)?,
    })
}

// ── Contact Messages ──

const CONTACT_COLUMNS: &str =
    "id, name, email, phone, subject, message, status, created_at, updated_at";

pub fn create_contact(conn: &Connection, contact: &ContactMessage) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO contact_messages (id, name, email, phone, subject, message, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            contact.id,
            contact.name,
            contact.email,
            contact.phone,
            contact.subject,
            contact.message,
            contact.status.as_str(),
            format_ts(&contact.created_at),
            format_ts(&contact.updated_at),
        ],
    )?;
    Ok(())
}

pub fn save_contact(conn: &Connection, contact: &ContactMessage) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE contact_messages SET name = ?1, email = ?2, phone = ?3, subject = ?4, message = ?5,
             status = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            contact.name,
            contact.email,
            contact.phone,
            contact.subject,
            contact.message,
            contact.status.as_str(),
            format_ts(&contact.updated_at),
            contact.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_contact(conn: &Connection, id: &str) -> anyhow::Result<Option<ContactMessage>> {
    let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact_messages WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_contact_row(row)))
        .optional()?;
    result.transpose()
}

pub fn delete_contact(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM contact_messages WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_contacts(
    conn: &Connection,
    filter: &ContactFilter,
    limit: u32,
    offset: i64,
) -> anyhow::Result<(Vec<ContactMessage>, i64)> {
    let mut clauses: Vec<String> = vec![];
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        params_vec.push(Box::new(like_pattern(q)));
        let n = params_vec.len();
        clauses.push(format!(
            "(name LIKE ?{n} OR email LIKE ?{n} OR subject LIKE ?{n})"
        ));
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", params_vec.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM contact_messages {where_sql}"),
        params_refs.as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contact_messages {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT {limit} OFFSET {offset}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_contact_row(row)))?;

    let mut contacts = vec![];
    for row in rows {
        contacts.push(row??);
    }
    Ok((contacts, total))
}

pub fn count_contacts(conn: &Connection, status: Option<ContactStatus>) -> anyhow::Result<i64> {
    let count: i64 = match status {
        Some(status) => conn.query_row(
            "SELECT COUNT(*) FROM contact_messages WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM contact_messages", [], |row| row.get(0))?,
    };
    Ok(count)
}

fn parse_contact_row(row: &rusqlite::Row) -> anyhow::Result<ContactMessage> {
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(ContactMessage {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        subject: row.get(4)?,
        message: row.get(5)?,
        status: ContactStatus::parse(&status_str)
            .with_context(|| format!("bad contact status: {status_str}"))?,
        created_at: parse_ts(&created_at_str)?,
        updated_at: parse_ts(&updated_at_str)?,
    })
}

// ── Admins ──

const ADMIN_COLUMNS: &str = "id, email, password_hash, name, role, is_active, last_login";

pub fn create_admin(conn: &Connection, admin: &AdminPrincipal) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO admins (id, email, password_hash, name, role, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            admin.id,
            admin.email,
            admin.password_hash,
            admin.name,
            admin.role.as_str(),
            admin.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_active_admin_by_email(
    conn: &Connection,
    email: &str,
) -> anyhow::Result<Option<AdminPrincipal>> {
    let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = ?1 AND is_active = 1");
    let result = conn
        .query_row(&sql, params![email], |row| Ok(parse_admin_row(row)))
        .optional()?;
    result.transpose()
}

pub fn get_admin_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<AdminPrincipal>> {
    let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1");
    let result = conn
        .query_row(&sql, params![id], |row| Ok(parse_admin_row(row)))
        .optional()?;
    result.transpose()
}

pub fn count_admins(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
    Ok(count)
}

pub fn touch_last_login(conn: &Connection, id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE admins SET last_login = ?1 WHERE id = ?2",
        params![format_ts(&Utc::now().naive_utc()), id],
    )?;
    Ok(())
}

fn parse_admin_row(row: &rusqlite::Row) -> anyhow::Result<AdminPrincipal> {
    let role_str: String = row.get(4)?;
    let last_login_str: Option<String> = row.get(6)?;

    Ok(AdminPrincipal {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        role: AdminRole::parse(&role_str).with_context(|| format!("bad role: {role_str}"))?,
        is_active: row.get::<_, i32>(5)? != 0,
        last_login: last_login_str.as_deref().map(parse_ts).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn booking(id: &str, date: &str, time: &str, status: BookingStatus) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            client_name: "Alice".to_string(),
            client_email: "alice@example.com".to_string(),
            client_phone: None,
            service_type: "Podcast Recording".to_string(),
            booking_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            booking_time: parse_time(time).unwrap(),
            duration_hours: 2,
            total_price: Decimal::from(300),
            payment_status: PaymentStatus::Pending,
            status,
            payment_reference: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_seeded_catalog() {
        let conn = setup_db();
        let services = list_services(&conn, true).unwrap();
        assert_eq!(services.len(), 4);
        // Ordered by name
        assert_eq!(services[0].name, "Audio Editing");

        let recording = find_active_service_by_name(&conn, "podcast recording")
            .unwrap()
            .unwrap();
        assert_eq!(recording.price_per_hour, Decimal::from(150));
        assert_eq!(recording.duration_hours, 2);
        assert_eq!(recording.features.len(), 4);
    }

    #[test]
    fn test_booking_round_trip() {
        let conn = setup_db();
        let b = booking("b-1", "2025-06-01", "10:00", BookingStatus::Confirmed);
        create_booking(&conn, &b).unwrap();

        let loaded = get_booking_by_id(&conn, "b-1").unwrap().unwrap();
        assert_eq!(loaded.booking_time, b.booking_time);
        assert_eq!(loaded.total_price, Decimal::from(300));
        assert_eq!(loaded.payment_status, PaymentStatus::Pending);
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_confirmed_slot_is_unique() {
        let conn = setup_db();
        create_booking(
            &conn,
            &booking("b-1", "2025-06-01", "10:00", BookingStatus::Confirmed),
        )
        .unwrap();

        let err = create_booking(
            &conn,
            &booking("b-2", "2025-06-01", "10:00", BookingStatus::Confirmed),
        )
        .unwrap_err();
        assert!(db::is_unique_violation(&err));

        // A cancelled booking does not hold the slot
        create_booking(
            &conn,
            &booking("b-3", "2025-06-01", "10:00", BookingStatus::Cancelled),
        )
        .unwrap();
    }

    #[test]
    fn test_reserved_times_only_confirmed() {
        let conn = setup_db();
        create_booking(
            &conn,
            &booking("b-1", "2025-06-01", "10:00", BookingStatus::Confirmed),
        )
        .unwrap();
        create_booking(
            &conn,
            &booking("b-2", "2025-06-01", "11:00", BookingStatus::Cancelled),
        )
        .unwrap();
        create_booking(
            &conn,
            &booking("b-3", "2025-06-02", "12:00", BookingStatus::Confirmed),
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let times = reserved_times(&conn, &date).unwrap();
        assert_eq!(times, vec![parse_time("10:00").unwrap()]);

        assert!(slot_taken(&conn, &date, &times[0], None).unwrap());
        assert!(!slot_taken(&conn, &date, &times[0], Some("b-1")).unwrap());
    }

    #[test]
    fn test_settle_payment_only_from_pending() {
        let conn = setup_db();
        create_booking(
            &conn,
            &booking("b-1", "2025-06-01", "10:00", BookingStatus::Confirmed),
        )
        .unwrap();

        assert!(settle_payment(
            &conn,
            "b-1",
            PaymentStatus::Completed,
            BookingStatus::Confirmed,
            Some("pi_123")
        )
        .unwrap());
        assert!(!settle_payment(
            &conn,
            "b-1",
            PaymentStatus::Failed,
            BookingStatus::Cancelled,
            None
        )
        .unwrap());

        let loaded = get_booking_by_id(&conn, "b-1").unwrap().unwrap();
        assert_eq!(loaded.payment_status, PaymentStatus::Completed);
        assert_eq!(loaded.payment_reference.as_deref(), Some("pi_123"));
        assert_eq!(
            get_booking_by_reference(&conn, "pi_123").unwrap().unwrap().id,
            "b-1"
        );
    }

    #[test]
    fn test_list_bookings_filters() {
        let conn = setup_db();
        let mut b1 = booking("b-1", "2025-06-01", "10:00", BookingStatus::Confirmed);
        b1.client_name = "Bob Builder".to_string();
        create_booking(&conn, &b1).unwrap();
        let mut b2 = booking("b-2", "2025-06-01", "11:00", BookingStatus::Cancelled);
        b2.payment_status = PaymentStatus::Failed;
        b2.service_type = "Audio Editing".to_string();
        create_booking(&conn, &b2).unwrap();

        let (all, total) = list_bookings(&conn, &BookingFilter::default(), 50, 0).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(total, 2);

        let filter = BookingFilter {
            q: Some("builder".to_string()),
            ..Default::default()
        };
        let (found, _) = list_bookings(&conn, &filter, 50, 0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b-1");

        let filter = BookingFilter {
            payment_status: Some(PaymentStatus::Failed),
            ..Default::default()
        };
        let (found, total) = list_bookings(&conn, &filter, 50, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, "b-2");

        let filter = BookingFilter {
            q: Some("audio".to_string()),
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        };
        let (found, total) = list_bookings(&conn, &filter, 50, 0).unwrap();
        assert!(found.is_empty());
        assert_eq!(total, 0);
    }
}
