//! Session token generation.

use base64::{engine::general_purpose, Engine as _};
use rand::Rng;

/// Default number of random bytes in a session token.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random token of `byte_len` bytes, base64-encoded.
///
/// Uniqueness is not checked here; the `sessions.token` unique constraint
/// rejects the (astronomically unlikely) collision.
pub fn generate_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill(bytes.as_mut_slice());
    general_purpose::STANDARD.encode(bytes)
}

/// Generate a session token.
///
/// Returns a base64-encoded string (44 characters) from 32 random bytes.
pub fn generate_session_token() -> String {
    generate_token(SESSION_TOKEN_BYTES)
}
