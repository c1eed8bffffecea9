//! Read-only settings snapshot shared by every service.

use std::{collections::BTreeSet, time::Duration};

use crate::domain::terms::Terms;

/// Default lifetime of an unvalidated session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default window in which a validated session may still be bound.
pub const DEFAULT_VALIDATED_SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default length of issued validation tokens.
pub const DEFAULT_TOKEN_LENGTH: usize = 6;

/// Default maximum number of threepids in a single bulk lookup.
pub const DEFAULT_ADDRESS_LOOKUP_LIMIT: usize = 10_000;

/// Identity server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Name this server signs as.
    pub server_name: String,

    /// Unvalidated sessions older than this are treated as expired.
    pub session_ttl: Duration,

    /// Validated sessions older than this can no longer be bound.
    pub validated_session_lifetime: Duration,

    /// Number of characters in an issued token.
    pub token_length: usize,

    /// Maximum number of entries accepted by a bulk lookup.
    pub address_lookup_limit: usize,

    /// Whether lookups add this server's signature to associations it relays.
    pub sign_lookups: bool,

    /// Homeservers allowed to register. Empty allows every homeserver.
    pub homeserver_allow_list: BTreeSet<String>,

    /// Published terms of service.
    pub terms: Terms,
}

impl Settings {
    /// Settings for `server_name` with every other value at its default.
    #[must_use]
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            session_ttl: DEFAULT_SESSION_TTL,
            validated_session_lifetime: DEFAULT_VALIDATED_SESSION_LIFETIME,
            token_length: DEFAULT_TOKEN_LENGTH,
            address_lookup_limit: DEFAULT_ADDRESS_LOOKUP_LIMIT,
            sign_lookups: true,
            homeserver_allow_list: BTreeSet::new(),
            terms: Terms::default(),
        }
    }

    /// Session TTL in milliseconds.
    #[must_use]
    pub fn session_ttl_ms(&self) -> i64 {
        duration_ms(self.session_ttl)
    }

    /// Validated session lifetime in milliseconds.
    #[must_use]
    pub fn validated_session_lifetime_ms(&self) -> i64 {
        duration_ms(self.validated_session_lifetime)
    }

    /// Whether `host` may register with this server.
    #[must_use]
    pub fn homeserver_allowed(&self, host: &str) -> bool {
        self.homeserver_allow_list.is_empty() || self.homeserver_allow_list.contains(host)
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_allows_everyone() {
        let settings = Settings::new("id.example.org");

        assert!(settings.homeserver_allowed("anything.example"));
    }

    #[test]
    fn allow_list_is_exact_match() {
        let mut settings = Settings::new("id.example.org");

        settings.homeserver_allow_list =
            ["friendly.com".to_string(), "example.com".to_string()].into();

        assert!(settings.homeserver_allowed("example.com"));
        assert!(!settings.homeserver_allowed("not.example.com"));
    }

    #[test]
    fn ttl_is_reported_in_milliseconds() {
        let mut settings = Settings::new("id.example.org");

        settings.session_ttl = Duration::from_secs(90);

        assert_eq!(settings.session_ttl_ms(), 90_000);
    }
}
