//! Session table operations.
//!
//! A session row maps an opaque token to its owning user and an absolute
//! expiry. Expired rows are not swept in the background; the resolver
//! deletes them when it next sees them.

use super::StoreError;
use crate::models::{StoredSession, StoredUser};
use sqlx::SqlitePool;

/// Insert a session.
///
/// Fails with `StoreError::ConstraintViolation` if the token is already in
/// use or `user_id` does not reference an existing user. A token collision
/// is surfaced, never retried.
pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    user_id: i64,
    expires_at: i64,
) -> Result<StoredSession, StoreError> {
    let session = sqlx::query_as::<_, StoredSession>(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?) \
         RETURNING id, token, user_id, expires_at, created_at",
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Flat shape of the session/user join.
#[derive(sqlx::FromRow)]
struct SessionUserRow {
    session_id: i64,
    token: String,
    expires_at: i64,
    session_created_at: i64,
    user_id: i64,
    email: String,
    password_hash: String,
    role: String,
    user_created_at: i64,
}

impl SessionUserRow {
    fn into_parts(self) -> (StoredSession, StoredUser) {
        (
            StoredSession {
                id: self.session_id,
                token: self.token,
                user_id: self.user_id,
                expires_at: self.expires_at,
                created_at: self.session_created_at,
            },
            StoredUser {
                id: self.user_id,
                email: self.email,
                password_hash: self.password_hash,
                role: self.role,
                created_at: self.user_created_at,
            },
        )
    }
}

/// Look up a session and its user by token in a single join.
///
/// Expired sessions are returned as-is; judging expiry is the caller's job.
pub async fn find_session_by_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<(StoredSession, StoredUser)>, StoreError> {
    let row = sqlx::query_as::<_, SessionUserRow>(
        "SELECT s.id AS session_id, s.token, s.expires_at, s.created_at AS session_created_at, \
                u.id AS user_id, u.email, u.password_hash, u.role, u.created_at AS user_created_at \
         FROM sessions s \
         INNER JOIN users u ON u.id = s.user_id \
         WHERE s.token = ? \
         LIMIT 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(SessionUserRow::into_parts))
}

/// Delete a session by token. Deleting an unknown token is not an error.
///
/// Returns true if a row was deleted.
pub async fn delete_session_by_token(pool: &SqlitePool, token: &str) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a session by ID.
pub async fn delete_session_by_id(pool: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
