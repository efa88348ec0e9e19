//! API route handlers.

pub mod api;
pub mod auth;

use crate::auth::middleware::{require_auth, resolve_session, AppState};
use crate::error::AppError;
use axum::{middleware, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// GET /: Liveness text
async fn index() -> &'static str {
    "Composito is running"
}

/// GET /health: Liveness probe with server time
async fn health() -> Json<Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({ "status": "ok", "timestamp": timestamp }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// `/auth/*` routes. Open to anonymous callers.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
}

/// `/api/*` routes, each behind a guard.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(api::list_models))
        .route_layer(middleware::from_fn(require_auth))
}

/// Build the full application.
///
/// The session resolver wraps every route, guarded or not, so identity is
/// attached before any guard or handler runs.
pub fn app(state: AppState) -> Router {
    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    // CorsLayer::new() with no allowed origins rejects all CORS preflight requests.
    let cors = CorsLayer::new();

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(auth_router())
        .merge(api_router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
