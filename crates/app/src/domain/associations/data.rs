//! Hashed lookup requests.

use std::{fmt, str::FromStr};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{crypto::encode_base64_url, domain::threepids::Medium};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported lookup algorithm {0}")]
pub struct UnsupportedAlgorithm(pub String);

/// How the addresses of a hashed lookup are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupAlgorithm {
    /// Plain `"<address> <medium>"` strings.
    None,

    /// URL-safe unpadded base64 of `sha256("<address> <medium> <pepper>")`.
    Sha256,
}

impl LookupAlgorithm {
    /// Every algorithm the server accepts, as advertised by `hash_details`.
    pub const ALL: [Self; 2] = [Self::None, Self::Sha256];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for LookupAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "sha256" => Ok(Self::Sha256),
            other => Err(UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Parameters a client needs to build a hashed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashDetails {
    pub algorithms: Vec<LookupAlgorithm>,
    pub lookup_pepper: String,
}

/// A hashed lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedLookup {
    pub algorithm: LookupAlgorithm,
    pub pepper: String,
    pub addresses: Vec<String>,
}

/// Digest stored alongside each association for `sha256` lookups.
#[must_use]
pub fn lookup_hash(address: &str, medium: Medium, pepper: &str) -> String {
    let digest = Sha256::digest(format!("{address} {medium} {pepper}").as_bytes());

    encode_base64_url(digest)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn algorithms_parse() -> TestResult {
        assert_eq!("none".parse::<LookupAlgorithm>()?, LookupAlgorithm::None);
        assert_eq!("sha256".parse::<LookupAlgorithm>()?, LookupAlgorithm::Sha256);
        assert_eq!(
            "md5".parse::<LookupAlgorithm>(),
            Err(UnsupportedAlgorithm("md5".to_string()))
        );

        Ok(())
    }

    #[test]
    fn hash_matches_published_example() {
        assert_eq!(
            lookup_hash("alice@example.com", Medium::Email, "matrixrocks"),
            "4kenr7N9drpCJ4AfalmlGQVsOn3o2RHjkADUpXJWZUc"
        );
    }

    #[test]
    fn hash_is_url_safe_and_unpadded() {
        let hash = lookup_hash("alice@example.org", Medium::Email, "matrixrocks");

        assert_eq!(hash.len(), 43);
        assert!(
            hash.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "{hash}"
        );
    }

    #[test]
    fn hash_depends_on_every_part() {
        let hash = lookup_hash("alice@example.org", Medium::Email, "pepper");

        assert_ne!(hash, lookup_hash("bob@example.org", Medium::Email, "pepper"));
        assert_ne!(hash, lookup_hash("alice@example.org", Medium::Msisdn, "pepper"));
        assert_ne!(hash, lookup_hash("alice@example.org", Medium::Email, "salt"));
    }
}
