//! Authentication layer: credential hashing, session tokens, session resolution and guards.

pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::{
    require_auth, require_role, resolve_session, AllowedRoles, AppState, CurrentUser,
    SESSION_COOKIE_NAME,
};
pub use password::{hash_password, verify_password};
pub use session::{generate_session_token, generate_token};
