//! Session resolution and access guards.
//!
//! [`resolve_session`] runs on every request and attaches a [`CurrentUser`]
//! to the request extensions. Guards and handlers read identity only from
//! that value; they never touch the store themselves.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Role, SessionUser};
use crate::storage::{self, StoreError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "composito_session";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
}

/// Outcome of resolving a request's session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session cookie on the request.
    NoToken,
    /// Cookie present but no matching session row.
    TokenInvalid,
    /// Session found but expired; the row has been deleted.
    TokenExpired,
    Authenticated(SessionUser),
}

impl SessionState {
    pub fn into_identity(self) -> Option<SessionUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Resolve a session token against the store as of `now` (unix seconds).
///
/// An expired session is deleted on the access that discovers it.
pub async fn resolve_token(
    db: &SqlitePool,
    token: Option<&str>,
    now: i64,
) -> Result<SessionState, StoreError> {
    let Some(token) = token else {
        return Ok(SessionState::NoToken);
    };

    let Some((session, user)) = storage::session::find_session_by_token(db, token).await? else {
        return Ok(SessionState::TokenInvalid);
    };

    if session.is_expired(now) {
        storage::session::delete_session_by_id(db, session.id).await?;
        tracing::info!(
            action = "session_expired",
            session_id = session.id,
            user_id = session.user_id,
            "Removed expired session"
        );
        return Ok(SessionState::TokenExpired);
    }

    Ok(SessionState::Authenticated(SessionUser::try_from(user)?))
}

/// Middleware that turns the session cookie into a [`CurrentUser`].
///
/// Fails open to anonymous: a store or decode failure is logged and the
/// request proceeds with no identity. It is never rejected here.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string());

    let identity = match resolve_token(&state.db, token.as_deref(), storage::unix_now()).await {
        Ok(session_state) => session_state.into_identity(),
        Err(e) => {
            tracing::error!(error = %e, "Session resolution failed; continuing as anonymous");
            None
        }
    };

    request.extensions_mut().insert(CurrentUser(identity));
    next.run(request).await
}

/// Request-scoped identity attached by [`resolve_session`]. `None` is anonymous.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session resolver not installed".to_string()))
    }
}

/// Allowed roles for [`require_role`].
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[Role]>);

impl AllowedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        AllowedRoles(roles.into_iter().collect())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// 401 unless there is an identity.
pub fn check_authenticated(user: Option<&SessionUser>) -> Result<&SessionUser, AppError> {
    user.ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
}

/// 403 unless there is an identity whose role is allowed.
pub fn check_role<'a>(
    user: Option<&'a SessionUser>,
    allowed: &AllowedRoles,
) -> Result<&'a SessionUser, AppError> {
    match user {
        Some(user) if allowed.contains(user.role) => Ok(user),
        _ => Err(AppError::Forbidden("Forbidden".to_string())),
    }
}

/// Guard: requires an authenticated caller.
///
/// ```rust,ignore
/// Router::new()
///     .route("/models", get(list_models))
///     .route_layer(axum::middleware::from_fn(require_auth));
/// ```
pub async fn require_auth(
    CurrentUser(user): CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    check_authenticated(user.as_ref())?;
    Ok(next.run(request).await)
}

/// Guard: requires a caller whose role is in the allowed set.
///
/// ```rust,ignore
/// Router::new()
///     .route("/review", get(review))
///     .route_layer(axum::middleware::from_fn_with_state(
///         AllowedRoles::new([Role::TcMember, Role::Subcommittee]),
///         require_role,
///     ));
/// ```
pub async fn require_role(
    State(allowed): State<AllowedRoles>,
    CurrentUser(user): CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    check_role(user.as_ref(), &allowed)?;
    Ok(next.run(request).await)
}
