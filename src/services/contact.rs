use rusqlite::Connection;
use uuid::Uuid;
use validator::Validate;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{self, ContactMessage, ContactPatch, ContactRequest, ContactStatus};
use crate::services::required;

/// Stores an inbound enquiry with status `new`.
pub fn submit(conn: &Connection, req: ContactRequest) -> AppResult<ContactMessage> {
    req.validate()?;

    let now = models::now();
    let contact = ContactMessage {
        id: Uuid::new_v4().to_string(),
        name: required(req.name, "name")?,
        email: required(req.email, "email")?.to_lowercase(),
        phone: req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        subject: required(req.subject, "subject")?,
        message: required(req.message, "message")?,
        status: ContactStatus::New,
        created_at: now,
        updated_at: now,
    };
    queries::create_contact(conn, &contact)?;

    tracing::info!(contact_id = %contact.id, subject = %contact.subject, "contact message received");
    Ok(contact)
}

pub fn update(conn: &Connection, id: &str, patch: ContactPatch) -> AppResult<ContactMessage> {
    patch.validate()?;
    let mut contact =
        queries::get_contact(conn, id)?.ok_or_else(|| AppError::NotFound("contact".to_string()))?;

    if let Some(status) = patch.status {
        contact.status = status;
    }
    if let Some(name) = patch.name {
        contact.name = required(Some(name), "name")?;
    }
    if let Some(email) = patch.email {
        contact.email = email.trim().to_lowercase();
    }
    if let Some(phone) = patch.phone {
        contact.phone = Some(phone.trim().to_string()).filter(|p| !p.is_empty());
    }
    if let Some(subject) = patch.subject {
        contact.subject = required(Some(subject), "subject")?;
    }
    if let Some(message) = patch.message {
        contact.message = required(Some(message), "message")?;
    }
    contact.updated_at = models::now();

    if !queries::save_contact(conn, &contact)? {
        return Err(AppError::NotFound("contact".to_string()));
    }
    Ok(contact)
}

pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
    if !queries::delete_contact(conn, id)? {
        return Err(AppError::NotFound("contact".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn request() -> ContactRequest {
        ContactRequest {
            name: Some(" Grace Hopper ".into()),
            email: Some("Grace@Example.com".into()),
            phone: None,
            subject: Some("Studio tour".into()),
            message: Some("Can we visit on Friday?".into()),
        }
    }

    #[test]
    fn test_submit_stores_new_message() {
        let conn = db::init_db(":memory:").unwrap();
        let contact = submit(&conn, request()).unwrap();

        assert_eq!(contact.name, "Grace Hopper");
        assert_eq!(contact.email, "grace@example.com");
        assert_eq!(contact.status, ContactStatus::New);
        assert_eq!(queries::get_contact(&conn, &contact.id).unwrap().unwrap(), contact);
        assert_eq!(queries::count_contacts(&conn, Some(ContactStatus::New)).unwrap(), 1);
    }

    #[test]
    fn test_submit_requires_all_fields() {
        let conn = db::init_db(":memory:").unwrap();

        let mut req = request();
        req.message = None;
        assert!(matches!(submit(&conn, req).unwrap_err(), AppError::InvalidFields(_)));

        let mut req = request();
        req.email = Some("nope".into());
        assert!(matches!(submit(&conn, req).unwrap_err(), AppError::InvalidFields(_)));

        let mut req = request();
        req.subject = Some("   ".into());
        assert!(matches!(submit(&conn, req).unwrap_err(), AppError::Validation(_)));
    }

    #[test]
    fn test_update_status() {
        let conn = db::init_db(":memory:").unwrap();
        let contact = submit(&conn, request()).unwrap();

        let patch = ContactPatch {
            status: Some(ContactStatus::Replied),
            ..Default::default()
        };
        let updated = update(&conn, &contact.id, patch).unwrap();
        assert_eq!(updated.status, ContactStatus::Replied);
        assert_eq!(queries::count_contacts(&conn, Some(ContactStatus::New)).unwrap(), 0);

        delete(&conn, &contact.id).unwrap();
        assert!(matches!(delete(&conn, &contact.id).unwrap_err(), AppError::NotFound(_)));
    }
}
