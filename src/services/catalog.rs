use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{self, Service, ServiceInput};

/// Active offerings, ordered by name.
pub fn list_active(conn: &Connection) -> AppResult<Vec<Service>> {
    Ok(queries::list_services(conn, true)?)
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Service>> {
    Ok(queries::list_services(conn, false)?)
}

fn checked(input: ServiceInput) -> AppResult<ServiceInput> {
    input.validate()?;
    let input = input.normalized();
    if input.name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if input.description.is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }
    if input.price_per_hour <= Decimal::ZERO {
        return Err(AppError::Validation(
            "price_per_hour must be greater than zero".to_string(),
        ));
    }
    Ok(input)
}

pub fn create_service(conn: &Connection, input: ServiceInput) -> AppResult<Service> {
    let input = checked(input)?;
    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description,
        price_per_hour: input.price_per_hour,
        duration_hours: input.duration_hours,
        features: input.features,
        is_active: input.is_active,
        created_at: models::now(),
    };

    queries::create_service(conn, &service)?;

    tracing::info!(service_id = %service.id, name = %service.name, "service created");
    Ok(service)
}

pub fn update_service(conn: &Connection, id: &str, input: ServiceInput) -> AppResult<Service> {
    let input = checked(input)?;
    if !queries::update_service(conn, id, &input)? {
        return Err(AppError::NotFound("service".to_string()));
    }
    tracing::info!(service_id = %id, "service updated");
    queries::get_service(conn, id)?.ok_or_else(|| AppError::NotFound("service".to_string()))
}

/// Existing bookings keep their `service_type` text after the entry is gone.
pub fn delete_service(conn: &Connection, id: &str) -> AppResult<()> {
    if !queries::delete_service(conn, id)? {
        return Err(AppError::NotFound("service".to_string()));
    }
    tracing::info!(service_id = %id, "service deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn input(name: &str, price: i64) -> ServiceInput {
        ServiceInput {
            name: name.to_string(),
            description: "Stereo mixdown".to_string(),
            price_per_hour: Decimal::from(price),
            duration_hours: 1,
            features: vec!["Stems".to_string()],
            is_active: true,
        }
    }

    #[test]
    fn test_list_active_hides_inactive() {
        let conn = db::init_db(":memory:").unwrap();
        let mut hidden = input("Vinyl Mastering", 90);
        hidden.is_active = false;
        create_service(&conn, hidden).unwrap();

        assert_eq!(list_active(&conn).unwrap().len(), 4);
        assert_eq!(list_all(&conn).unwrap().len(), 5);
    }

    #[test]
    fn test_create_and_update() {
        let conn = db::init_db(":memory:").unwrap();
        let created = create_service(&conn, input(" Mixing ", 80)).unwrap();
        assert_eq!(created.name, "Mixing");

        let updated = update_service(&conn, &created.id, input("Mixing", 95)).unwrap();
        assert_eq!(updated.price_per_hour, Decimal::from(95));
        assert_eq!(updated.id, created.id);
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let conn = db::init_db(":memory:").unwrap();
        let err = create_service(&conn, input("Free Lunch", 0)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_rejects_blank_description() {
        let conn = db::init_db(":memory:").unwrap();
        let mut blank = input("Mixing", 80);
        blank.description = "   ".to_string();
        let err = create_service(&conn, blank).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = create_service(&conn, input("Mixing", 80)).unwrap();
        let mut blank = input("Mixing", 80);
        blank.description = "\t".to_string();
        assert!(matches!(
            update_service(&conn, &created.id, blank).unwrap_err(),
            AppError::Validation(_)
        ));
        assert_eq!(list_all(&conn).unwrap().len(), 5);
    }

    #[test]
    fn test_missing_service() {
        let conn = db::init_db(":memory:").unwrap();
        assert!(matches!(
            update_service(&conn, "nope", input("Mixing", 80)).unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            delete_service(&conn, "nope").unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
