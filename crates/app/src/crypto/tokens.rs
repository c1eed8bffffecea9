//! Random tokens and their at-rest digests.

use std::fmt;

use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Number of characters in an issued access token.
pub const ACCESS_TOKEN_LENGTH: usize = 64;

/// Fixed-length code drawn from `[A-Za-z0-9]`.
#[must_use]
pub fn alphanumeric_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Fixed-length code drawn from `[0-9]`, easier to type from a text message.
#[must_use]
pub fn numeric_token(length: usize) -> String {
    (0..length)
        .map(|_| char::from(b'0' + OsRng.gen_range(0..10_u8)))
        .collect()
}

/// Compare two secrets without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());

    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Opaque bearer token handed to an account.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn generate() -> Self {
        Self(alphanumeric_token(ACCESS_TOKEN_LENGTH))
    }

    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 digest, the only form that is persisted.
    #[must_use]
    pub fn hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(**redacted**)")
    }
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
