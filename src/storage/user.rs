//! User table operations.
//!
//! Emails are stored lowercased and trimmed; callers pass them through
//! [`normalize_email`] before both writes and lookups.

use super::StoreError;
use crate::models::{normalize_email, Role, SessionUser, StoredUser};
use sqlx::SqlitePool;

/// Insert a user.
///
/// Fails with `StoreError::ConstraintViolation` if the email is taken.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<StoredUser, StoreError> {
    let user = sqlx::query_as::<_, StoredUser>(
        "INSERT INTO users (email, password_hash, role) VALUES (?, ?, ?) \
         RETURNING id, email, password_hash, role, created_at",
    )
    .bind(normalize_email(email))
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get a user by email. The email is normalized before lookup.
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<StoredUser>, StoreError> {
    let user = sqlx::query_as::<_, StoredUser>(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ? LIMIT 1",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Delete a user. Their sessions go with them via the cascade.
///
/// Returns true if the user was deleted, false if it didn't exist.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

impl TryFrom<StoredUser> for SessionUser {
    type Error = StoreError;

    fn try_from(user: StoredUser) -> Result<Self, Self::Error> {
        let role = user.role.parse::<Role>().map_err(StoreError::Decode)?;
        Ok(SessionUser {
            id: user.id,
            email: user.email,
            role,
        })
    }
}
