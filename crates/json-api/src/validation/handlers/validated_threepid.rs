//! Get Validated Threepid Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use tessera_app::domain::{
    sessions::records::SessionId,
    threepids::{Medium, validate_client_secret},
};

use crate::{errors::MatrixError, extensions::*, state::State, validation::into_matrix_error};

/// Get Validated Threepid Request
#[derive(Debug, Deserialize)]
pub(crate) struct ValidatedThreepidRequest {
    #[serde(deserialize_with = "params::session_id")]
    pub sid: SessionId,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ValidatedThreepidResponse {
    pub medium: Medium,
    pub address: String,
    pub validated_at: i64,
}

/// The threepid a validated session proved ownership of.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<ValidatedThreepidResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: ValidatedThreepidRequest = Params::from_request(req)
        .await?
        .parse(&["sid", "client_secret"])?;

    validate_client_secret(&request.client_secret)?;

    let validated = state
        .app
        .sessions
        .get_validated_threepid(request.sid, &request.client_secret)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(ValidatedThreepidResponse {
        medium: validated.medium,
        address: validated.address,
        validated_at: validated.validated_at,
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use tessera_app::domain::sessions::{
        MockSessionsService, SessionsServiceError, data::ValidatedThreepid,
    };

    use crate::{
        errors::ErrorBody,
        test_helpers::{TestState, service},
    };

    use super::*;

    fn make_service(sessions: MockSessionsService) -> Service {
        service(
            TestState::new().sessions(sessions).build(),
            Router::with_path("3pid/getValidated3pid").get(handler),
        )
    }

    #[tokio::test]
    async fn returns_validated_threepid() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions
            .expect_get_validated_threepid()
            .once()
            .withf(|sid, client_secret| *sid == 9 && client_secret == "secret")
            .return_once(|_, _| {
                Ok(ValidatedThreepid {
                    medium: Medium::Email,
                    address: "alice@example.org".to_string(),
                    validated_at: 1_234,
                })
            });

        let mut res = TestClient::get("http://example.com/3pid/getValidated3pid?sid=9&client_secret=secret")
            .send(&make_service(sessions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: ValidatedThreepidResponse = res.take_json().await?;

        assert_eq!(
            body,
            ValidatedThreepidResponse {
                medium: Medium::Email,
                address: "alice@example.org".to_string(),
                validated_at: 1_234,
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn unvalidated_session_is_reported() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions
            .expect_get_validated_threepid()
            .once()
            .return_once(|_, _| Err(SessionsServiceError::NotValidated));

        let mut res = TestClient::get("http://example.com/3pid/getValidated3pid?sid=9&client_secret=secret")
            .send(&make_service(sessions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_SESSION_NOT_VALIDATED");

        Ok(())
    }

    #[tokio::test]
    async fn missing_sid_returns_missing_params() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions.expect_get_validated_threepid().never();

        let mut res = TestClient::get("http://example.com/3pid/getValidated3pid?client_secret=secret")
            .send(&make_service(sessions))
            .await;

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_MISSING_PARAMS");

        Ok(())
    }
}
