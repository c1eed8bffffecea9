//! Request Msisdn Token Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;

use tessera_app::domain::{
    sessions::data::TokenRequest,
    threepids::{Medium, Threepid, validate_client_secret},
};

use crate::{
    errors::MatrixError,
    extensions::*,
    state::State,
    validation::{RequestTokenResponse, into_matrix_error},
};

/// Request Msisdn Token Request
#[derive(Debug, Deserialize)]
pub(crate) struct RequestMsisdnTokenRequest {
    pub phone_number: String,
    pub client_secret: String,
    #[serde(deserialize_with = "params::send_attempt")]
    pub send_attempt: u32,
    pub next_link: Option<String>,
}

/// Send a validation token to a phone number by SMS.
///
/// `country` is required for compatibility but numbers are expected in
/// international form already.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<RequestTokenResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: RequestMsisdnTokenRequest = Params::from_json_body(req)
        .await?
        .parse(&["country", "phone_number", "client_secret", "send_attempt"])?;

    validate_client_secret(&request.client_secret)?;

    let threepid = Threepid::parse(Medium::Msisdn, &request.phone_number)?;

    let requested = state
        .app
        .sessions
        .request_token(TokenRequest {
            threepid,
            client_secret: request.client_secret,
            send_attempt: request.send_attempt,
            next_link: request.next_link,
        })
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(RequestTokenResponse {
        sid: requested.sid.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use tessera_app::domain::sessions::{MockSessionsService, data::RequestedToken};

    use crate::{
        errors::ErrorBody,
        test_helpers::{TestState, service},
    };

    use super::*;

    const URL: &str = "http://example.com/validate/msisdn/requestToken";

    fn make_service(sessions: MockSessionsService) -> Service {
        service(
            TestState::new().sessions(sessions).build(),
            Router::with_path("validate/msisdn/requestToken").post(handler),
        )
    }

    #[tokio::test]
    async fn request_token_normalises_phone_number() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions
            .expect_request_token()
            .once()
            .withf(|request| {
                request.threepid.medium == Medium::Msisdn
                    && request.threepid.address == "447700900123"
                    && request.send_attempt == 2
            })
            .return_once(|_| {
                Ok(RequestedToken {
                    sid: 3,
                    dispatched: true,
                })
            });

        let mut res = TestClient::post(URL)
            .json(&json!({
                "country": "GB",
                "phone_number": "+44 7700 900123",
                "client_secret": "secret",
                "send_attempt": "2",
            }))
            .send(&make_service(sessions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: RequestTokenResponse = res.take_json().await?;

        assert_eq!(body.sid, "3");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_phone_number_returns_invalid_address() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions.expect_request_token().never();

        let mut res = TestClient::post(URL)
            .json(&json!({
                "country": "GB",
                "phone_number": "12ab",
                "client_secret": "secret",
                "send_attempt": 1,
            }))
            .send(&make_service(sessions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_INVALID_ADDRESS");

        Ok(())
    }

    #[tokio::test]
    async fn missing_country_returns_missing_params() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions.expect_request_token().never();

        let mut res = TestClient::post(URL)
            .json(&json!({
                "phone_number": "447700900123",
                "client_secret": "secret",
                "send_attempt": 1,
            }))
            .send(&make_service(sessions))
            .await;

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_MISSING_PARAMS");
        assert_eq!(body.error, "Missing parameters: country");

        Ok(())
    }
}
