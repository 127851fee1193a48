use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::async_trait;
use axum_extra::extract::CookieJar;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Claims;
use crate::services::auth;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "admin_session";
pub const LOGIN_PATH: &str = "/admin/login";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"))
}

fn authenticate(state: &AppState, headers: &HeaderMap, jar: &CookieJar) -> Result<Claims, AppError> {
    let token = bearer_token(headers)
        .map(str::to_string)
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AppError::Unauthorized)?;

    let claims = auth::validate_token(&token, &state.config.jwt_secret)?;

    let db = state.db()?;
    match queries::get_admin_by_id(&db, &claims.admin_id)? {
        Some(admin) if admin.is_active => Ok(claims),
        _ => {
            tracing::warn!(admin_id = %claims.admin_id, "token for missing or inactive admin");
            Err(AppError::Unauthorized)
        }
    }
}

/// Guards every admin route. Browser navigations without a session are sent
/// to the login page, API calls get a 401.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers(), &jar) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(AppError::Unauthorized) if wants_html(request.headers()) => {
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// The session claims of the admin making the request.
pub struct AdminSession(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AdminSession)
            .ok_or(AppError::Unauthorized)
    }
}
