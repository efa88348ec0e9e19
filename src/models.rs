//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models mirror the `users` and `sessions` tables.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Login request body.
///
/// Both fields are optional at the type level so that a missing field is
/// answered with a 400 by the handler rather than a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response after successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: SessionUser,
}

/// Response for `GET /auth/me`. `user` is `null` for anonymous callers.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<SessionUser>,
}

/// Response after logout.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// The `{id, email, role}` view of a user attached to a request after
/// successful session validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Row of the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredUser {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: i64,
}

/// Row of the `sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredSession {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub expires_at: i64,
    pub created_at: i64,
}

impl StoredSession {
    /// A session is logically invalid once its expiry is strictly in the past.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

// ============================================================================
// User Roles
// ============================================================================

/// User role types, ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TcMember,
    Subcommittee,
    #[default]
    Public,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TcMember => "tc_member",
            Role::Subcommittee => "subcommittee",
            Role::Public => "public",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tc_member" => Ok(Role::TcMember),
            "subcommittee" => Ok(Role::Subcommittee),
            "public" => Ok(Role::Public),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Normalize an email for storage and lookup: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
