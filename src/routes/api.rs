//! Business API endpoints. Every route here sits behind an access guard.

use axum::Json;
use serde_json::{json, Value};

/// GET /api/models: List models (requires an authenticated caller)
pub async fn list_models() -> Json<Value> {
    Json(json!({ "models": [] }))
}
