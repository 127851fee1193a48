use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppResult;
use crate::services::catalog;
use crate::state::AppState;

// GET /services
pub async fn list_services(State(state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    let services = {
        let db = state.db()?;
        catalog::list_active(&db)?
    };
    Ok(Json(serde_json::json!({ "services": services })))
}
