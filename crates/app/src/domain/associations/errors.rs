//! Associations service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    crypto::SigningError,
    domain::{sessions::SessionsServiceError, threepids::ThreepidError},
};

#[derive(Debug, Error)]
pub enum AssociationsServiceError {
    #[error(transparent)]
    Threepid(#[from] ThreepidError),

    #[error("too many threepids in one lookup: {count} > {limit}")]
    TooLarge { count: usize, limit: usize },

    #[error("lookup pepper does not match the current one")]
    InvalidPepper,

    #[error(transparent)]
    Session(#[from] SessionsServiceError),

    #[error("mxid does not match the authenticated user")]
    MxidMismatch,

    #[error("session was not validated for this threepid")]
    ThreepidMismatch,

    #[error("failed to sign association")]
    Signing(#[from] SigningError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AssociationsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::Session(SessionsServiceError::NotFound);
        }

        Self::Sql(error)
    }
}
