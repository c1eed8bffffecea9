//! Matrix error responses.

use salvo::{
    http::StatusCode,
    prelude::{Json, Response, Scribe},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use tessera_app::domain::threepids::ThreepidError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ErrorBody {
    pub errcode: String,
    pub error: String,
}

/// An error rendered as `{"errcode", "error"}` with a status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{errcode}: {error}")]
pub(crate) struct MatrixError {
    pub status: StatusCode,
    pub errcode: &'static str,
    pub error: String,
}

impl MatrixError {
    pub(crate) fn new(status: StatusCode, errcode: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            errcode,
            error: error.into(),
        }
    }

    pub(crate) fn not_json() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "M_NOT_JSON",
            "Request body is not a JSON object",
        )
    }

    pub(crate) fn missing_params<S: AsRef<str>>(missing: &[S]) -> Self {
        let missing = missing
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ");

        Self::new(
            StatusCode::BAD_REQUEST,
            "M_MISSING_PARAMS",
            format!("Missing parameters: {missing}"),
        )
    }

    pub(crate) fn invalid_param(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "M_INVALID_PARAM", error)
    }

    pub(crate) fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "M_UNAUTHORIZED", error)
    }

    pub(crate) fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "M_UNAUTHORIZED", error)
    }

    pub(crate) fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "M_NOT_FOUND", error)
    }

    pub(crate) fn unknown(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "M_UNKNOWN", error)
    }

    /// Log `source` and hide it behind a generic 500.
    pub(crate) fn internal(context: &str, source: &dyn std::error::Error) -> Self {
        error!("{context}: {source}");

        Self::unknown("Internal server error")
    }
}

impl Scribe for MatrixError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(ErrorBody {
            errcode: self.errcode.to_string(),
            error: self.error,
        }));
    }
}

impl From<ThreepidError> for MatrixError {
    fn from(error: ThreepidError) -> Self {
        match error {
            ThreepidError::InvalidEmail => {
                Self::new(StatusCode::BAD_REQUEST, "M_INVALID_EMAIL", "Invalid email address")
            }
            ThreepidError::InvalidMsisdn => Self::new(
                StatusCode::BAD_REQUEST,
                "M_INVALID_ADDRESS",
                "Invalid phone number",
            ),
            ThreepidError::InvalidClientSecret => Self::invalid_param("Invalid client_secret"),
            ThreepidError::UnknownMedium(medium) => {
                Self::invalid_param(format!("Unsupported medium {medium}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use super::*;

    #[handler]
    async fn fails() -> Result<&'static str, MatrixError> {
        Err(MatrixError::missing_params(&["client_secret", "sid"]))
    }

    #[tokio::test]
    async fn renders_errcode_and_message() -> TestResult {
        let service = Service::new(Router::new().get(fails));

        let mut res = TestClient::get("http://example.com").send(&service).await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_MISSING_PARAMS");
        assert_eq!(body.error, "Missing parameters: client_secret, sid");

        Ok(())
    }

    #[test]
    fn threepid_errors_map_to_specific_codes() {
        assert_eq!(
            MatrixError::from(ThreepidError::InvalidEmail).errcode,
            "M_INVALID_EMAIL"
        );
        assert_eq!(
            MatrixError::from(ThreepidError::InvalidMsisdn).errcode,
            "M_INVALID_ADDRESS"
        );
        assert_eq!(
            MatrixError::from(ThreepidError::InvalidClientSecret).errcode,
            "M_INVALID_PARAM"
        );
    }
}
