//! Association Errors

use salvo::http::StatusCode;

use tessera_app::domain::associations::AssociationsServiceError;

use crate::{errors::MatrixError, validation};

pub(crate) fn into_matrix_error(error: AssociationsServiceError) -> MatrixError {
    match error {
        AssociationsServiceError::Threepid(error) => error.into(),
        AssociationsServiceError::TooLarge { limit, .. } => too_large(limit),
        AssociationsServiceError::InvalidPepper => MatrixError::new(
            StatusCode::BAD_REQUEST,
            "M_INVALID_PEPPER",
            "Unknown or invalid pepper",
        ),
        AssociationsServiceError::Session(error) => validation::into_matrix_error(error),
        AssociationsServiceError::MxidMismatch => {
            MatrixError::forbidden("This user is prohibited from changing this mxid")
        }
        AssociationsServiceError::ThreepidMismatch => {
            MatrixError::forbidden("This session was not validated for that threepid")
        }
        AssociationsServiceError::Signing(source) => {
            MatrixError::internal("failed to sign association", &source)
        }
        AssociationsServiceError::Sql(source) => {
            MatrixError::internal("association storage failed", &source)
        }
    }
}

pub(crate) fn too_large(limit: usize) -> MatrixError {
    MatrixError::new(
        StatusCode::BAD_REQUEST,
        "M_TOO_LARGE",
        format!("More than the maximum of {limit} threepids in one request"),
    )
}
