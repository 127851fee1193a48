use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, middleware::require_admin};
use crate::state::AppState;

fn cors(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!(origin = %origin, "invalid CORS_ORIGIN, cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/admin/me", get(handlers::auth::me))
        .route("/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/admin/bookings/:id",
            patch(handlers::admin::update_booking).delete(handlers::admin::delete_booking),
        )
        .route("/admin/contacts", get(handlers::admin::list_contacts))
        .route(
            "/admin/contacts/:id",
            patch(handlers::admin::update_contact).delete(handlers::admin::delete_contact),
        )
        .route(
            "/admin/services",
            get(handlers::admin::list_services).post(handlers::admin::create_service),
        )
        .route(
            "/admin/services/:id",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        .route("/admin/dashboard", get(handlers::admin::get_dashboard))
        .route("/admin/analytics", get(handlers::admin::get_analytics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/services", get(handlers::services::list_services))
        .route(
            "/bookings/available-times",
            get(handlers::bookings::available_times),
        )
        .route("/bookings", post(handlers::bookings::create_booking))
        .route("/bookings/:id", get(handlers::bookings::get_booking))
        .route("/payments/create", post(handlers::payments::create))
        .route("/payments/confirm", post(handlers::payments::confirm))
        .route("/payments/webhook", post(handlers::payments::webhook))
        .route("/contact", post(handlers::contact::submit))
        .route(
            "/admin/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route("/admin/logout", post(handlers::auth::logout))
        .merge(admin)
        .layer(cors(state.config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
