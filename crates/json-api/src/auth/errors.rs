//! Account errors.

use salvo::http::StatusCode;

use tessera_app::{domain::accounts::AccountsServiceError, federation::FederationError};

use crate::errors::MatrixError;

pub(crate) fn into_matrix_error(error: AccountsServiceError) -> MatrixError {
    match error {
        AccountsServiceError::InvalidServerName(_) => {
            MatrixError::invalid_param("matrix_server_name must be a valid Matrix server name")
        }
        AccountsServiceError::HomeserverNotAllowed(_) => {
            MatrixError::forbidden("This homeserver is not allowed to register")
        }
        AccountsServiceError::Federation(FederationError::NotJson(source)) => {
            tracing::warn!("homeserver userinfo was not JSON: {source}");

            MatrixError::unknown("The Matrix homeserver returned invalid JSON")
        }
        AccountsServiceError::Federation(FederationError::MissingSubject) => {
            MatrixError::unknown("The Matrix homeserver did not include 'sub' in its response")
        }
        AccountsServiceError::Federation(source) => {
            tracing::warn!("failed to query homeserver: {source}");

            MatrixError::unknown("Unable to contact the Matrix homeserver")
        }
        AccountsServiceError::ForeignUser { .. } => MatrixError::unknown(
            "The Matrix homeserver returned a MXID belonging to another homeserver",
        ),
        AccountsServiceError::Unauthorized => MatrixError::unauthorized("Unrecognised access token"),
        AccountsServiceError::TermsNotSigned => MatrixError::new(
            StatusCode::FORBIDDEN,
            "M_TERMS_NOT_SIGNED",
            "Terms not signed",
        ),
        AccountsServiceError::Sql(source) => MatrixError::internal("account storage failed", &source),
    }
}
