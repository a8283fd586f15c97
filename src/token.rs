//! # Token Utilities
//!
//! Random token generation and secret comparison for token-bearing records
//! (runner tokens, personal access tokens, feed tokens).
//!
//! ## Invariants
//! - Tokens come from the OS random source
//! - Token comparison is constant-time

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a random token of `bytes` random bytes, URL-safe base64 encoded
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes.max(1)];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// SHA-256 digest of a token, URL-safe base64 encoded
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Constant-time comparison of two byte slices
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
