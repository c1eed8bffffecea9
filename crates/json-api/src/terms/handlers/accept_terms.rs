//! Accept Terms Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    errors::MatrixError, extensions::*, state::State, terms::into_matrix_error,
};

#[derive(Debug, Deserialize)]
struct AcceptTermsRequest {
    user_accepts: UserAccepts,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserAccepts {
    One(String),
    Many(Vec<String>),
}

impl From<UserAccepts> for Vec<String> {
    fn from(accepts: UserAccepts) -> Self {
        match accepts {
            UserAccepts::One(url) => vec![url],
            UserAccepts::Many(urls) => urls,
        }
    }
}

/// Record the documents the authenticated user agreed to.
///
/// `user_accepts` is a list of URLs, or a single URL.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<Map<String, Value>>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user_id = depot.user_id_or_401()?;
    let request: AcceptTermsRequest = Params::from_json_body(req)
        .await?
        .parse(&["user_accepts"])?;

    let urls = Vec::from(request.user_accepts);

    let sufficient = state
        .app
        .terms
        .record_agreement(user_id, urls)
        .await
        .map_err(into_matrix_error)?;

    debug!(user_id, sufficient, "recorded terms agreement");

    Ok(Json(Map::new()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use tessera_app::domain::terms::{MockTermsService, TermsServiceError};

    use crate::{
        errors::ErrorBody,
        test_helpers::{TEST_USER_ID, TestState, authenticated_service},
    };

    use super::*;

    const URL: &str = "http://example.com/terms";

    fn make_service(terms: MockTermsService) -> Service {
        authenticated_service(
            TestState::new().terms(terms).build(),
            Router::with_path("terms").post(handler),
        )
    }

    #[tokio::test]
    async fn accepted_urls_are_recorded() -> TestResult {
        let mut terms = MockTermsService::new();

        terms
            .expect_record_agreement()
            .once()
            .withf(|user_id, urls| user_id == TEST_USER_ID && *urls == ["url1", "url2"])
            .return_once(|_, _| Ok(true));

        let mut res = TestClient::post(URL)
            .json(&json!({"user_accepts": ["url1", "url2"]}))
            .send(&make_service(terms))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({}));

        Ok(())
    }

    #[tokio::test]
    async fn single_url_is_accepted() -> TestResult {
        let mut terms = MockTermsService::new();

        terms
            .expect_record_agreement()
            .once()
            .withf(|_, urls| *urls == ["url1"])
            .return_once(|_, _| Ok(false));

        let res = TestClient::post(URL)
            .json(&json!({"user_accepts": "url1"}))
            .send(&make_service(terms))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn unrecognised_urls_are_rejected() -> TestResult {
        let mut terms = MockTermsService::new();

        terms.expect_record_agreement().once().return_once(|_, _| {
            Err(TermsServiceError::UnrecognisedTerms(vec!["nope".to_string()]))
        });

        let mut res = TestClient::post(URL)
            .json(&json!({"user_accepts": ["nope"]}))
            .send(&make_service(terms))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_UNKNOWN");
        assert_eq!(body.error, "Unrecognised URLs: nope");

        Ok(())
    }

    #[tokio::test]
    async fn non_string_urls_are_invalid() -> TestResult {
        let mut terms = MockTermsService::new();

        terms.expect_record_agreement().never();

        let mut res = TestClient::post(URL)
            .json(&json!({"user_accepts": [1, 2]}))
            .send(&make_service(terms))
            .await;

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_INVALID_PARAM");

        Ok(())
    }
}
