//! Homeserver client for OpenID userinfo queries.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::federation::server_name::ServerName;

/// Default bound on a single federation request.
pub const DEFAULT_FEDERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity the homeserver vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenIdUserInfo {
    /// The Matrix user id the token was issued to.
    pub sub: String,
}

/// Errors that can occur when querying a homeserver.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Building the HTTP client failed.
    #[error("failed to build federation client")]
    Client(#[source] reqwest::Error),

    /// The homeserver could not be reached or timed out.
    #[error("homeserver could not be reached")]
    Unavailable(#[source] reqwest::Error),

    /// The homeserver answered with a non-2xx status.
    #[error("homeserver responded with status {0}")]
    Status(u16),

    /// The homeserver answered with something that is not JSON.
    #[error("homeserver response was not JSON")]
    NotJson(#[source] serde_json::Error),

    /// The response did not name a user.
    #[error("homeserver response did not include 'sub'")]
    MissingSubject,
}

#[automock]
#[async_trait]
pub trait HomeserverClient: Send + Sync {
    /// Exchange an OpenID token for the user id it was issued to.
    async fn openid_userinfo(
        &self,
        server: &ServerName,
        access_token: &str,
    ) -> Result<OpenIdUserInfo, FederationError>;
}

/// Federation client over HTTPS.
#[derive(Debug, Clone)]
pub struct ReqwestHomeserverClient {
    http: Client,
}

impl ReqwestHomeserverClient {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, FederationError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(FederationError::Client)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HomeserverClient for ReqwestHomeserverClient {
    async fn openid_userinfo(
        &self,
        server: &ServerName,
        access_token: &str,
    ) -> Result<OpenIdUserInfo, FederationError> {
        let url = format!(
            "{}/_matrix/federation/v1/openid/userinfo",
            server.federation_base_url()
        );

        debug!(server = %server, "querying openid userinfo");

        let response = self
            .http
            .get(&url)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|error| {
                warn!(server = %server, error = %error, "federation request failed");

                FederationError::Unavailable(error)
            })?;

        let status = response.status();

        let body = response
            .bytes()
            .await
            .map_err(FederationError::Unavailable)?;

        if !status.is_success() {
            return Err(FederationError::Status(status.as_u16()));
        }

        parse_userinfo(&body)
    }
}

fn parse_userinfo(body: &[u8]) -> Result<OpenIdUserInfo, FederationError> {
    let value: Value = serde_json::from_slice(body).map_err(FederationError::NotJson)?;

    let sub = value
        .get("sub")
        .and_then(Value::as_str)
        .ok_or(FederationError::MissingSubject)?;

    Ok(OpenIdUserInfo {
        sub: sub.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_subject() -> TestResult {
        let info = parse_userinfo(br#"{"sub": "@alice:example.org"}"#)?;

        assert_eq!(info.sub, "@alice:example.org");

        Ok(())
    }

    #[test]
    fn non_json_body_is_reported() {
        let result = parse_userinfo(b"<html>nope</html>");

        assert!(matches!(result, Err(FederationError::NotJson(_))), "got {result:?}");
    }

    #[test]
    fn missing_subject_is_reported() {
        let result = parse_userinfo(br#"{"user": "@alice:example.org"}"#);

        assert!(matches!(result, Err(FederationError::MissingSubject)), "got {result:?}");
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() -> TestResult {
        let client = ReqwestHomeserverClient::new(Duration::from_millis(500))?;
        let server: ServerName = "127.0.0.1:1".parse()?;

        let result = client.openid_userinfo(&server, "token").await;

        assert!(
            matches!(result, Err(FederationError::Unavailable(_))),
            "got {result:?}"
        );

        Ok(())
    }
}
