//! Unbind Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};

use tessera_app::domain::{
    sessions::records::SessionId,
    threepids::{Medium, Threepid, validate_client_secret},
};

use crate::{
    associations::into_matrix_error, errors::MatrixError, extensions::*, state::State,
};

#[derive(Debug, Deserialize)]
struct UnbindRequest {
    #[serde(deserialize_with = "params::session_id")]
    sid: SessionId,
    client_secret: String,
    threepid: ThreepidParam,
    mxid: String,
}

#[derive(Debug, Deserialize)]
struct ThreepidParam {
    medium: String,
    address: String,
}

impl TryFrom<ThreepidParam> for Threepid {
    type Error = MatrixError;

    fn try_from(param: ThreepidParam) -> Result<Self, Self::Error> {
        let medium = param.medium.parse::<Medium>()?;

        Ok(Self::parse(medium, &param.address)?)
    }
}

/// Remove the authenticated user's association with a threepid.
///
/// The caller proves ownership of the threepid with a validated session.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<Map<String, Value>>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user_id = depot.user_id_or_401()?;
    let request: UnbindRequest = Params::from_json_body(req)
        .await?
        .parse(&["sid", "client_secret", "threepid", "mxid"])?;

    validate_client_secret(&request.client_secret)?;

    let threepid = Threepid::try_from(request.threepid)?;

    state
        .app
        .associations
        .unbind(request.sid, &request.client_secret, &threepid, &request.mxid, user_id)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(Map::new()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use tessera_app::domain::associations::{AssociationsServiceError, MockAssociationsService};

    use crate::{
        errors::ErrorBody,
        test_helpers::{TEST_USER_ID, TestState, authenticated_service},
    };

    use super::*;

    const URL: &str = "http://example.com/3pid/unbind";

    fn make_service(associations: MockAssociationsService) -> Service {
        authenticated_service(
            TestState::new().associations(associations).build(),
            Router::with_path("3pid/unbind").post(handler),
        )
    }

    fn body(threepid: &Value) -> Value {
        json!({
            "sid": "4",
            "client_secret": "secret",
            "mxid": TEST_USER_ID,
            "threepid": threepid,
        })
    }

    #[tokio::test]
    async fn unbind_removes_association() -> TestResult {
        let mut associations = MockAssociationsService::new();

        associations
            .expect_unbind()
            .once()
            .withf(|sid, _, threepid, mxid, user| {
                *sid == 4
                    && threepid.address == "alice@example.org"
                    && mxid == TEST_USER_ID
                    && user == TEST_USER_ID
            })
            .return_once(|_, _, _, _, _| Ok(1));

        let mut res = TestClient::post(URL)
            .json(&body(&json!({"medium": "email", "address": "Alice@example.org"})))
            .send(&make_service(associations))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({}));

        Ok(())
    }

    #[tokio::test]
    async fn other_threepid_is_forbidden() -> TestResult {
        let mut associations = MockAssociationsService::new();

        associations
            .expect_unbind()
            .once()
            .return_once(|_, _, _, _, _| Err(AssociationsServiceError::ThreepidMismatch));

        let mut res = TestClient::post(URL)
            .json(&body(&json!({"medium": "email", "address": "bob@example.org"})))
            .send(&make_service(associations))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_threepid_is_invalid() -> TestResult {
        for threepid in [json!("email"), json!({"medium": "email"}), json!({"medium": "fax", "address": "1"})] {
            let mut associations = MockAssociationsService::new();

            associations.expect_unbind().never();

            let mut res = TestClient::post(URL)
                .json(&body(&threepid))
                .send(&make_service(associations))
                .await;

            assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST), "{threepid}");

            let body: ErrorBody = res.take_json().await?;

            assert_eq!(body.errcode, "M_INVALID_PARAM", "{threepid}");
        }

        Ok(())
    }
}
