//! Storage key derivation shared by the video and thumbnail paths.
//!
//! Uniqueness comes only from the random token. No collision check or retry
//! is performed; 256 bits of entropy make a collision negligible.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 32;

/// 32 bytes from the thread-local CSPRNG, encoded as unpadded URL-safe base64.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compose `{prefix}/{token}{extension}`.
pub fn derive_key(prefix: &str, extension: &str) -> String {
    format!("{}/{}{}", prefix, random_token(), extension)
}

/// Compose `{token}{extension}` for flat asset directories.
pub fn derive_filename(extension: &str) -> String {
    format!("{}{}", random_token(), extension)
}
