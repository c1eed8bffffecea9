//! Terms Errors

use salvo::http::StatusCode;

use tessera_app::domain::terms::TermsServiceError;

use crate::errors::MatrixError;

pub(crate) fn into_matrix_error(error: TermsServiceError) -> MatrixError {
    match error {
        TermsServiceError::UnrecognisedTerms(urls) => MatrixError::new(
            StatusCode::BAD_REQUEST,
            "M_UNKNOWN",
            format!("Unrecognised URLs: {}", urls.join(", ")),
        ),
        TermsServiceError::AccountNotFound => MatrixError::unauthorized("Unrecognised access token"),
        TermsServiceError::Sql(source) => MatrixError::internal("terms storage failed", &source),
    }
}
