//! Third-party identifiers and their wire-level syntax rules.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted client secret.
pub const MAX_CLIENT_SECRET_LENGTH: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThreepidError {
    #[error("unsupported medium {0}")]
    UnknownMedium(String),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid phone number")]
    InvalidMsisdn,

    #[error("invalid client_secret")]
    InvalidClientSecret,
}

/// Kind of third-party identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Email,
    Msisdn,
}

impl Medium {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Msisdn => "msisdn",
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medium {
    type Err = ThreepidError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "email" => Ok(Self::Email),
            "msisdn" => Ok(Self::Msisdn),
            other => Err(ThreepidError::UnknownMedium(other.to_string())),
        }
    }
}

/// A validated (medium, address) pair in normalised form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Threepid {
    pub medium: Medium,
    pub address: String,
}

impl Threepid {
    /// Validate and normalise `address` for `medium`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreepidError::InvalidEmail`] or [`ThreepidError::InvalidMsisdn`]
    /// when the address is not acceptable for the medium.
    pub fn parse(medium: Medium, address: &str) -> Result<Self, ThreepidError> {
        let address = match medium {
            Medium::Email => normalise_email(address)?,
            Medium::Msisdn => normalise_msisdn(address)?,
        };

        Ok(Self { medium, address })
    }

    /// Normalise `address` for lookups without rejecting it.
    ///
    /// Unknown or malformed addresses simply never match a stored association.
    #[must_use]
    pub fn for_lookup(medium: Medium, address: &str) -> Self {
        Self::parse(medium, address).unwrap_or_else(|_error| Self {
            medium,
            address: address.to_string(),
        })
    }
}

/// Check `address` is a bare email address and return it lowercased.
///
/// The address is parsed as a mailbox and the extracted `addr-spec` must be
/// identical to the input, so display names and angle brackets are rejected.
///
/// # Errors
///
/// Returns [`ThreepidError::InvalidEmail`] when the address does not parse or
/// carries anything besides the bare address.
pub fn normalise_email(address: &str) -> Result<String, ThreepidError> {
    let parsed = parse_mailbox(address).ok_or(ThreepidError::InvalidEmail)?;

    if parsed != address {
        return Err(ThreepidError::InvalidEmail);
    }

    Ok(address.to_lowercase())
}

fn parse_mailbox(input: &str) -> Option<&str> {
    let trimmed = input.trim();

    let candidate = match (trimmed.rfind('<'), trimmed.ends_with('>')) {
        (Some(open), true) => trimmed.get(open + 1..trimmed.len() - 1)?,
        (None, false) => trimmed,
        _ => return None,
    };

    is_addr_spec(candidate).then_some(candidate)
}

fn is_addr_spec(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };

    let atom = |c: char| {
        c.is_alphanumeric()
            || "!#$%&'*+-/=?^_`{|}~".contains(c)
            || (!c.is_ascii() && !c.is_control())
    };

    let dot_atom = |part: &str| {
        !part.is_empty()
            && part
                .split('.')
                .all(|segment| !segment.is_empty() && segment.chars().all(atom))
    };

    dot_atom(local) && dot_atom(domain) && !domain.contains('@')
}

/// Strip punctuation from a phone number and check it is 5-15 digits.
///
/// # Errors
///
/// Returns [`ThreepidError::InvalidMsisdn`] for anything else.
pub fn normalise_msisdn(address: &str) -> Result<String, ThreepidError> {
    let digits: String = address
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '.' | '-' | '(' | ')'))
        .collect();

    let valid = (5..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0');

    if !valid {
        return Err(ThreepidError::InvalidMsisdn);
    }

    Ok(digits)
}

/// Check a client secret is 1-255 characters of `[0-9a-zA-Z.=_-]`.
///
/// # Errors
///
/// Returns [`ThreepidError::InvalidClientSecret`] otherwise.
pub fn validate_client_secret(client_secret: &str) -> Result<(), ThreepidError> {
    let valid = !client_secret.is_empty()
        && client_secret.len() <= MAX_CLIENT_SECRET_LENGTH
        && client_secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '=' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ThreepidError::InvalidClientSecret)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn bare_email_is_accepted_and_lowercased() -> TestResult {
        assert_eq!(
            normalise_email("Alice.Smith+tag@Example.ORG")?,
            "alice.smith+tag@example.org"
        );

        Ok(())
    }

    #[test]
    fn display_name_is_rejected() {
        assert_eq!(
            normalise_email("Naughty Nigel <perfectly.valid@mail.address>"),
            Err(ThreepidError::InvalidEmail)
        );
    }

    #[test]
    fn bracketed_address_is_rejected() {
        assert_eq!(
            normalise_email("<perfectly.valid@mail.address>"),
            Err(ThreepidError::InvalidEmail)
        );
    }

    #[test]
    fn multiple_at_signs_are_rejected() {
        assert_eq!(
            normalise_email("not@an@email@address"),
            Err(ThreepidError::InvalidEmail)
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for address in [
            "",
            "plainaddress",
            "@example.org",
            "alice@",
            "a..b@example.org",
            " a@b.c",
            "a b@c.d",
        ] {
            assert_eq!(
                normalise_email(address),
                Err(ThreepidError::InvalidEmail),
                "{address:?} should be rejected"
            );
        }
    }

    #[test]
    fn msisdn_punctuation_is_stripped() -> TestResult {
        assert_eq!(normalise_msisdn("+44 (7700) 900-123")?, "447700900123");
        assert_eq!(normalise_msisdn("1.202.555.0173")?, "12025550173");

        Ok(())
    }

    #[test]
    fn msisdn_rules_are_enforced() {
        for address in ["1234", "1234567890123456", "07700900123", "44abc900123", ""] {
            assert_eq!(
                normalise_msisdn(address),
                Err(ThreepidError::InvalidMsisdn),
                "{address:?} should be rejected"
            );
        }
    }

    #[test]
    fn client_secret_syntax() {
        assert!(validate_client_secret("abc.DEF=_-123").is_ok(), "valid secret rejected");
        assert!(validate_client_secret(&"a".repeat(255)).is_ok(), "255 chars rejected");

        assert_eq!(validate_client_secret(""), Err(ThreepidError::InvalidClientSecret));
        assert_eq!(
            validate_client_secret(&"a".repeat(256)),
            Err(ThreepidError::InvalidClientSecret)
        );
        assert_eq!(
            validate_client_secret("has space"),
            Err(ThreepidError::InvalidClientSecret)
        );
    }

    #[test]
    fn medium_parses_known_values() -> TestResult {
        assert_eq!("email".parse::<Medium>()?, Medium::Email);
        assert_eq!("msisdn".parse::<Medium>()?, Medium::Msisdn);
        assert_eq!(
            "fax".parse::<Medium>(),
            Err(ThreepidError::UnknownMedium("fax".to_string()))
        );

        Ok(())
    }

    #[test]
    fn lookup_normalisation_never_fails() {
        let threepid = Threepid::for_lookup(Medium::Msisdn, "not a number");

        assert_eq!(threepid.address, "not a number");
    }
}
