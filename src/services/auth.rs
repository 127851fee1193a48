use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{AdminPrincipal, AdminRole, Claims};
use crate::state::AppState;

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(anyhow::anyhow!("hashing failed: {e}")))
}

pub fn issue_token(admin: &AdminPrincipal, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        admin_id: admin.id.clone(),
        email: admin.email.clone(),
        role: admin.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))
}

/// Checks signature and expiry. Any failure is reported as `Unauthorized`.
pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected admin token");
        AppError::Unauthorized
    })
}

/// Verifies credentials and returns a fresh session token with the admin.
/// Unknown email, inactive account and wrong password are indistinguishable.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> AppResult<(String, AdminPrincipal)> {
    let email = email.trim().to_lowercase();
    let admin = {
        let db = state.db()?;
        queries::get_active_admin_by_email(&db, &email)?
    };
    let Some(admin) = admin else {
        tracing::warn!(email = %email, "login for unknown admin");
        return Err(AppError::Unauthorized);
    };

    let password = password.to_owned();
    let hash = admin.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))?
        .unwrap_or(false);

    if !valid {
        tracing::warn!(admin_id = %admin.id, "login with wrong password");
        return Err(AppError::Unauthorized);
    }

    {
        let db = state.db()?;
        queries::touch_last_login(&db, &admin.id)?;
    }

    let token = issue_token(&admin, &state.config.jwt_secret, state.config.session_ttl_hours)?;
    tracing::info!(admin_id = %admin.id, "admin logged in");
    Ok((token, admin))
}

/// Creates the first `super_admin` from `ADMIN_EMAIL`/`ADMIN_PASSWORD` when
/// the admins table is empty. Returns whether an account was created.
pub fn bootstrap_admin(conn: &Connection, config: &AppConfig, cost: u32) -> AppResult<bool> {
    if config.admin_email.is_empty() || config.admin_password.is_empty() {
        return Ok(false);
    }
    if queries::count_admins(conn)? > 0 {
        return Ok(false);
    }

    let admin = AdminPrincipal {
        id: Uuid::new_v4().to_string(),
        email: config.admin_email.trim().to_lowercase(),
        password_hash: hash_password(&config.admin_password, cost)?,
        name: config.admin_name.clone(),
        role: AdminRole::SuperAdmin,
        is_active: true,
        last_login: None,
    };
    queries::create_admin(conn, &admin)?;

    tracing::info!(email = %admin.email, "bootstrapped initial admin");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const SECRET: &str = "test-secret";

    fn admin() -> AdminPrincipal {
        AdminPrincipal {
            id: "a-1".into(),
            email: "owner@studio.test".into(),
            password_hash: String::new(),
            name: "Owner".into(),
            role: AdminRole::Admin,
            is_active: true,
            last_login: None,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(&admin(), SECRET, 24).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.admin_id, "a-1");
        assert_eq!(claims.role, AdminRole::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&admin(), SECRET, 24).unwrap();
        assert!(matches!(
            validate_token(&token, "other").unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&admin(), SECRET, -2).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET).unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.token", SECRET).is_err());
    }

    #[test]
    fn test_bootstrap_only_once() {
        let conn = db::init_db(":memory:").unwrap();
        let mut config = AppConfig::from_env();
        config.admin_email = "Owner@Studio.test".into();
        config.admin_password = "hunter22".into();

        assert!(bootstrap_admin(&conn, &config, 4).unwrap());
        assert!(!bootstrap_admin(&conn, &config, 4).unwrap());

        let stored = queries::get_active_admin_by_email(&conn, "owner@studio.test")
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, AdminRole::SuperAdmin);
        assert!(bcrypt::verify("hunter22", &stored.password_hash).unwrap());
    }

    #[test]
    fn test_bootstrap_skipped_without_credentials() {
        let conn = db::init_db(":memory:").unwrap();
        let mut config = AppConfig::from_env();
        config.admin_email = String::new();
        assert!(!bootstrap_admin(&conn, &config, 4).unwrap());
    }
}
