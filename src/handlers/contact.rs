use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppResult;
use crate::handlers::extract::ValidatedJson;
use crate::models::ContactRequest;
use crate::services::contact;
use crate::state::AppState;

// POST /contact
pub async fn submit(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ContactRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let message = {
        let db = state.db()?;
        contact::submit(&db, req)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Thanks for reaching out! We'll get back to you within 24 hours.",
        "contact": {
            "id": message.id,
            "name": message.name,
            "email": message.email,
            "subject": message.subject,
        },
    })))
}
