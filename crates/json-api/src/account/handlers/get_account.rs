//! Get Account Handler

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::MatrixError, extensions::*};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AccountResponse {
    pub user_id: String,
}

/// The user the access token belongs to.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<AccountResponse>, MatrixError> {
    let user_id = depot.user_id_or_401()?;

    Ok(Json(AccountResponse {
        user_id: user_id.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::{TEST_USER_ID, TestState, authenticated_service};

    use super::*;

    #[tokio::test]
    async fn returns_authenticated_user() -> TestResult {
        let service = authenticated_service(
            TestState::new().build(),
            Router::with_path("account").get(handler),
        );

        let mut res = TestClient::get("http://example.com/account").send(&service).await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: AccountResponse = res.take_json().await?;

        assert_eq!(body.user_id, TEST_USER_ID);

        Ok(())
    }
}
