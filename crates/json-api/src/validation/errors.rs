//! Validation Errors

use salvo::http::StatusCode;
use tracing::error;

use tessera_app::domain::sessions::SessionsServiceError;

use crate::errors::MatrixError;

pub(crate) fn into_matrix_error(error: SessionsServiceError) -> MatrixError {
    match error {
        SessionsServiceError::Threepid(error) => error.into(),
        SessionsServiceError::NotFound => MatrixError::new(
            StatusCode::NOT_FOUND,
            "M_NO_VALID_SESSION",
            "No valid session was found matching that sid and client secret",
        ),
        SessionsServiceError::Expired => MatrixError::new(
            StatusCode::BAD_REQUEST,
            "M_SESSION_EXPIRED",
            "This validation session has expired: call requestToken again",
        ),
        SessionsServiceError::IncorrectToken => {
            MatrixError::invalid_param("The token is incorrect")
        }
        SessionsServiceError::NotValidated => MatrixError::new(
            StatusCode::BAD_REQUEST,
            "M_SESSION_NOT_VALIDATED",
            "This validation session has not yet been completed",
        ),
        SessionsServiceError::Delivery(source) => {
            error!("failed to deliver validation token: {source}");

            MatrixError::unknown("Failed to send the validation token")
        }
        SessionsServiceError::Sql(source) => {
            MatrixError::internal("session storage failed", &source)
        }
    }
}
