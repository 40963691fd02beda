//! Random token and filename generation.
//!
//! Tokens are the capability: whoever holds one can spend a view. They are
//! random bytes from the OS-seeded generator, url-safe base64 encoded with
//! no padding, so they drop straight into a path segment.

use crate::constants::{FILENAME_BYTES, TOKEN_BYTES};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Fresh link token (16 random bytes, 22 encoded characters).
pub fn generate_token() -> String {
    random_urlsafe(TOKEN_BYTES)
}

/// Fresh blob filename (12 random bytes plus a ".jpg" suffix).
pub fn generate_blob_filename() -> String {
    format!("{}.jpg", random_urlsafe(FILENAME_BYTES))
}

fn random_urlsafe(byte_len: usize) -> String {
    let mut buf = vec![0u8; byte_len];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Truncated token for log fields. Full tokens never appear in logs.
pub fn token_log_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(crate::constants::TOKEN_LOG_PREFIX_LEN)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
