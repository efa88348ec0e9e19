//! Auth API endpoints.

use crate::auth::middleware::{AppState, CurrentUser, SESSION_COOKIE_NAME};
use crate::auth::password::verify_password;
use crate::auth::session::generate_session_token;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, LogoutResponse, MeResponse, SessionUser};
use crate::storage;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Session cookie carrying `token`, living as long as the session row.
fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Empty, already-expired session cookie with the same path, so the client discards it.
fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

/// POST /auth/login: Verify credentials and create a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected login body");
        AppError::BadRequest("Invalid request body".to_string())
    })?;

    let (email, password) = match (req.email, req.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Email and password required".to_string(),
            ))
        }
    };

    // Unknown email and wrong password share one message to avoid user enumeration
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let Some(user) = storage::user::get_user_by_email(&state.db, &email).await? else {
        tracing::warn!(action = "login_failed", reason = "unknown_email", "Login rejected");
        return Err(invalid());
    };

    let password_hash = user.password_hash.clone();
    let valid =
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await?;

    if !valid {
        tracing::warn!(action = "login_failed", reason = "bad_password", user_id = user.id, "Login rejected");
        return Err(invalid());
    }

    let identity = SessionUser::try_from(user)?;

    let token = generate_session_token();
    let ttl_secs = i64::try_from(state.config.session_ttl_secs).map_err(|_| {
        AppError::Internal(format!(
            "Session TTL out of range: {}",
            state.config.session_ttl_secs
        ))
    })?;
    let expires_at = storage::unix_now()
        .checked_add(ttl_secs)
        .ok_or_else(|| AppError::Internal(format!("Session expiry overflows: ttl={}", ttl_secs)))?;

    storage::session::create_session(&state.db, &token, identity.id, expires_at).await?;

    tracing::info!(action = "login_success", user_id = identity.id, role = %identity.role, "User authenticated");

    let jar = jar.add(session_cookie(token, ttl_secs, state.config.cookie_secure));

    Ok((jar, Json(LoginResponse { user: identity })))
}

/// POST /auth/logout: Delete the current session and clear the cookie
///
/// Succeeds whether or not the request carried a session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let deleted = storage::session::delete_session_by_token(&state.db, cookie.value()).await?;
        tracing::info!(action = "logout", session_deleted = deleted, "User logged out");
    }

    let jar = jar.add(removal_cookie(state.config.cookie_secure));

    Ok((jar, Json(LogoutResponse { success: true })))
}

/// GET /auth/me: Current identity, or `null` when anonymous
pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}
