//! Identity Config

use std::{collections::BTreeSet, path::PathBuf, time::Duration};

use clap::Args;

use tessera_app::{domain::terms::Terms, settings::Settings};

/// Identity server behaviour.
#[derive(Debug, Args)]
pub struct IdentityConfig {
    /// Name this server signs associations as
    #[arg(long, env = "SERVER_NAME")]
    pub server_name: String,

    /// Path of the ed25519 signing key, generated when missing
    #[arg(long, env = "SIGNING_KEY_PATH", default_value = "tessera.signing.key")]
    pub signing_key_path: PathBuf,

    /// Minutes an unvalidated session stays usable
    #[arg(long, env = "SESSION_TTL_MINUTES", default_value_t = 1_440)]
    pub session_ttl_minutes: u64,

    /// Hours a validated session can still be bound
    #[arg(long, env = "VALIDATED_SESSION_LIFETIME_HOURS", default_value_t = 24)]
    pub validated_session_lifetime_hours: u64,

    /// Length of issued validation tokens
    #[arg(long, env = "TOKEN_LENGTH", default_value_t = 6)]
    pub token_length: usize,

    /// Most threepids accepted by one bulk lookup
    #[arg(long, env = "ADDRESS_LOOKUP_LIMIT", default_value_t = 10_000)]
    pub address_lookup_limit: usize,

    /// Add this server's signature to associations returned by lookups
    #[arg(long, env = "SIGN_LOOKUPS", default_value_t = true, action = clap::ArgAction::Set)]
    pub sign_lookups: bool,

    /// YAML file describing the terms of service
    #[arg(long, env = "TERMS_PATH")]
    pub terms_path: Option<PathBuf>,

    /// Homeservers allowed to register (comma separated)
    #[arg(long, env = "HOMESERVER_ALLOW_LIST", value_delimiter = ',')]
    pub homeserver_allow_list: Vec<String>,

    /// Serve the unauthenticated v1 API
    #[arg(long, env = "ENABLE_V1_ACCESS", default_value_t = true, action = clap::ArgAction::Set)]
    pub enable_v1_access: bool,

    /// Seconds to wait for a homeserver during registration
    #[arg(long, env = "FEDERATION_TIMEOUT_SECONDS", default_value_t = 10)]
    pub federation_timeout_seconds: u64,
}

impl IdentityConfig {
    pub(crate) fn settings(&self, terms: Terms) -> Settings {
        let mut settings = Settings::new(self.server_name.clone());

        settings.session_ttl = Duration::from_secs(self.session_ttl_minutes * 60);
        settings.validated_session_lifetime =
            Duration::from_secs(self.validated_session_lifetime_hours * 60 * 60);
        settings.token_length = self.token_length;
        settings.address_lookup_limit = self.address_lookup_limit;
        settings.sign_lookups = self.sign_lookups;
        settings.homeserver_allow_list = self
            .homeserver_allow_list
            .iter()
            .map(|host| host.trim())
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        settings.terms = terms;

        settings
    }

    pub(crate) fn federation_timeout(&self) -> Duration {
        Duration::from_secs(self.federation_timeout_seconds)
    }
}
