use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::handlers::extract::ValidatedJson;
use crate::handlers::middleware::{AdminSession, SESSION_COOKIE};
use crate::models::LoginRequest;
use crate::services::auth;
use crate::state::AppState;

static LOGIN_HTML: &str = include_str!("../web/login.html");

// GET /admin/login
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

// POST /admin/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<serde_json::Value>)> {
    let (token, admin) = auth::login(&state, &req.email, &req.password).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    Ok((
        jar.add(cookie),
        Json(serde_json::json!({
            "success": true,
            "token": token,
            "admin": {
                "id": admin.id,
                "email": admin.email,
                "name": admin.name,
                "role": admin.role,
            },
        })),
    ))
}

// POST /admin/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(serde_json::json!({ "success": true })),
    )
}

// GET /admin/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    AdminSession(claims): AdminSession,
) -> AppResult<Json<serde_json::Value>> {
    let admin = {
        let db = state.db()?;
        queries::get_admin_by_id(&db, &claims.admin_id)?
    }
    .ok_or(AppError::Unauthorized)?;
    Ok(Json(serde_json::json!({ "admin": admin })))
}
