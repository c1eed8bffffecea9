//! Logout Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde_json::{Map, Value};

use crate::{
    auth::{into_matrix_error, middleware::extract_access_token},
    errors::MatrixError,
    extensions::*,
    state::State,
};

/// Revoke the access token used for this request.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<Map<String, Value>>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let token =
        extract_access_token(req).ok_or_else(|| MatrixError::unauthorized("Unauthorized"))?;

    state
        .app
        .accounts
        .logout(&token)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(Map::new()))
}

#[cfg(test)]
mod tests {
    use salvo::{
        http::header::AUTHORIZATION,
        test::{ResponseExt, TestClient},
    };
    use serde_json::json;
    use testresult::TestResult;

    use tessera_app::domain::accounts::{AccountsServiceError, MockAccountsService};

    use crate::test_helpers::{TestState, service};

    use super::*;

    fn make_service(accounts: MockAccountsService) -> Service {
        service(
            TestState::new().accounts(accounts).build(),
            Router::with_path("account/logout").post(handler),
        )
    }

    #[tokio::test]
    async fn logout_revokes_request_token() -> TestResult {
        let mut accounts = MockAccountsService::new();

        accounts
            .expect_logout()
            .once()
            .withf(|token| token == "abc123")
            .return_once(|_| Ok(()));

        let mut res = TestClient::post("http://example.com/account/logout")
            .add_header(AUTHORIZATION, "Bearer abc123", true)
            .send(&make_service(accounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({}));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_returns_401() -> TestResult {
        let mut accounts = MockAccountsService::new();

        accounts
            .expect_logout()
            .once()
            .return_once(|_| Err(AccountsServiceError::Unauthorized));

        let res = TestClient::post("http://example.com/account/logout?access_token=gone")
            .send(&make_service(accounts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
