//! PBKDF2-HMAC-SHA256 credential hashing.
//!
//! Stored format: `base64(salt):base64(derived_key)`. The format carries no
//! algorithm or iteration marker, so the constants below are fixed for the
//! lifetime of every stored hash.

use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroizing;

/// PBKDF2 iteration count.
pub const ITERATIONS: u32 = 100_000;
/// Derived key length in bytes (256 bits).
pub const HASH_LENGTH: usize = 32;
/// Salt length in bytes (128 bits).
pub const SALT_LENGTH: usize = 16;

fn derive(password: &str, salt: &[u8]) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut key = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut key[..]);
    key
}

/// Hash a password with a fresh random salt.
///
/// Any string, including the empty one, produces a valid hash.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::rng().fill(&mut salt);

    let key = derive(password, &salt);

    format!(
        "{}:{}",
        general_purpose::STANDARD.encode(salt),
        general_purpose::STANDARD.encode(&key[..])
    )
}

/// Verify a password against a stored `salt:hash` string.
///
/// Malformed input is a rejection, never an error: anything other than
/// exactly two non-empty `:`-separated parts, or a salt that is not valid
/// base64, yields `false`.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.split(':');
    let (salt_b64, expected_b64) = match (parts.next(), parts.next(), parts.next()) {
        (Some(salt), Some(hash), None) if !salt.is_empty() && !hash.is_empty() => (salt, hash),
        _ => return false,
    };

    let salt = match general_purpose::STANDARD.decode(salt_b64) {
        Ok(salt) => salt,
        Err(_) => return false,
    };

    let key = derive(password, &salt);
    let actual_b64 = Zeroizing::new(general_purpose::STANDARD.encode(&key[..]));

    constant_time_eq(actual_b64.as_bytes(), expected_b64.as_bytes())
}

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Lengths are checked first; equal-length inputs are always scanned in full.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
