//! Terms errors.

use std::io;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermsFileError {
    #[error("failed to read terms file")]
    Read(#[source] io::Error),

    #[error("failed to parse terms file")]
    Parse(#[from] serde_norway::Error),

    #[error("terms documents are published without a master_version")]
    MissingMasterVersion,
}

#[derive(Debug, Error)]
pub enum TermsServiceError {
    #[error("Unrecognised URLs: {}", .0.join(", "))]
    UnrecognisedTerms(Vec<String>),

    #[error("account not found")]
    AccountNotFound,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for TermsServiceError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::AccountNotFound,
            Some(_) | None => Self::Sql(error),
        }
    }
}
