//! Server configuration module

use clap::Parser;
use thiserror::Error;

use tessera_app::{
    domain::terms::{Terms, TermsFileError},
    settings::Settings,
};

use crate::config::{
    db::DatabaseConfig,
    delivery::DeliveryConfig,
    identity::IdentityConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod delivery;
pub(crate) mod identity;
pub(crate) mod observability;
pub(crate) mod server;

/// Shortest accepted validation token.
const MIN_TOKEN_LENGTH: usize = 4;

/// Longest accepted validation token.
const MAX_TOKEN_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("HOMESERVER_ALLOW_LIST requires ENABLE_V1_ACCESS=false")]
    AllowListWithV1,

    #[error("TOKEN_LENGTH must be between {MIN_TOKEN_LENGTH} and {MAX_TOKEN_LENGTH}, got {0}")]
    TokenLength(usize),

    #[error("failed to load terms from {path}: {source}")]
    Terms {
        path: String,
        #[source]
        source: TermsFileError,
    },
}

/// Tessera JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "tessera-json", about = "Tessera identity server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (metrics, slow requests) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Identity server behaviour.
    #[command(flatten)]
    pub identity: IdentityConfig,

    /// Token delivery settings.
    #[command(flatten)]
    pub delivery: DeliveryConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed or is inconsistent
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        let config = Self::try_parse()?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.identity.homeserver_allow_list.is_empty() && self.identity.enable_v1_access {
            return Err(ConfigError::AllowListWithV1);
        }

        if !(MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&self.identity.token_length) {
            return Err(ConfigError::TokenLength(self.identity.token_length));
        }

        Ok(())
    }

    /// Build the settings snapshot the services share.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured terms file cannot be loaded.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let terms = match &self.identity.terms_path {
            Some(path) => Terms::load(path).map_err(|source| ConfigError::Terms {
                path: path.display().to_string(),
                source,
            })?,
            None => Terms::default(),
        };

        Ok(self.identity.settings(terms))
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use testresult::TestResult;

    use super::*;

    fn parse(args: &[&str]) -> Result<ServerConfig, clap::Error> {
        ServerConfig::try_parse_from(
            ["tessera-json", "--server-name", "id.example.org"]
                .iter()
                .chain(args),
        )
    }

    #[test]
    fn defaults_are_valid() -> TestResult {
        let config = parse(&[])?;

        config.validate()?;

        let settings = config.settings()?;

        assert_eq!(settings.server_name, "id.example.org");
        assert_eq!(settings.token_length, 6);
        assert_eq!(settings.address_lookup_limit, 10_000);
        assert!(settings.sign_lookups, "lookups are signed by default");
        assert!(config.identity.enable_v1_access, "v1 is enabled by default");

        Ok(())
    }

    #[test]
    fn allow_list_requires_v1_disabled() -> TestResult {
        let config = parse(&["--homeserver-allow-list", "friendly.com,example.com"])?;

        assert!(
            matches!(config.validate(), Err(ConfigError::AllowListWithV1)),
            "allow list accepted with v1 enabled"
        );

        let config = parse(&[
            "--homeserver-allow-list",
            "friendly.com,example.com",
            "--enable-v1-access",
            "false",
        ])?;

        config.validate()?;

        assert_eq!(
            config.settings()?.homeserver_allow_list,
            BTreeSet::from(["example.com".to_string(), "friendly.com".to_string()])
        );

        Ok(())
    }

    #[test]
    fn token_length_is_bounded() -> TestResult {
        let config = parse(&["--token-length", "3"])?;

        assert!(
            matches!(config.validate(), Err(ConfigError::TokenLength(3))),
            "short token length accepted"
        );

        Ok(())
    }
}
