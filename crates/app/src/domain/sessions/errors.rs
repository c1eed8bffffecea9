//! Sessions service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{delivery::DeliveryError, domain::threepids::ThreepidError};

#[derive(Debug, Error)]
pub enum SessionsServiceError {
    #[error(transparent)]
    Threepid(#[from] ThreepidError),

    #[error("no valid session was found")]
    NotFound,

    #[error("session has expired")]
    Expired,

    #[error("token is incorrect")]
    IncorrectToken,

    #[error("session has not been validated")]
    NotValidated,

    #[error("failed to send token")]
    Delivery(#[from] DeliveryError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SessionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}
