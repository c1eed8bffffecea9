//! Accounts service errors.

use sqlx::Error;
use thiserror::Error;

use crate::federation::{FederationError, InvalidServerName};

#[derive(Debug, Error)]
pub enum AccountsServiceError {
    #[error(transparent)]
    InvalidServerName(#[from] InvalidServerName),

    #[error("homeserver {0} is not allowed to register")]
    HomeserverNotAllowed(String),

    #[error("homeserver request failed")]
    Federation(#[from] FederationError),

    #[error("homeserver vouched for {sub}, which is not on {server_name}")]
    ForeignUser { sub: String, server_name: String },

    #[error("unknown access token")]
    Unauthorized,

    #[error("terms of service have not been agreed to")]
    TermsNotSigned,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AccountsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::Unauthorized;
        }

        Self::Sql(error)
    }
}
