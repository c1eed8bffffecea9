//! App Router

use salvo::{catcher::Catcher, prelude::*};

use crate::{
    account, associations, auth, errors::MatrixError, pubkey, status, terms, validation,
};

const V2_PREFIX: &str = "_matrix/identity/v2";
const V1_PREFIX: &str = "_matrix/identity/api/v1";

/// Identity API routes. The v1 tree is only mounted when `enable_v1` is set.
pub(crate) fn app_router(enable_v1: bool) -> Router {
    let router = Router::new().push(v2_router());

    if enable_v1 {
        router.push(v1_router())
    } else {
        router
    }
}

fn v2_router() -> Router {
    Router::with_path(V2_PREFIX)
        .get(status::handler)
        .push(pubkey_router())
        .push(Router::with_path("account/register").post(account::register::handler))
        .push(Router::with_path("terms").get(terms::get_terms::handler))
        .push(submit_token_router(|route| {
            route.get(validation::submit_token::handler)
        }))
        .push(
            Router::new()
                .hoop(auth::middleware::without_terms)
                .push(Router::with_path("account").get(account::get_account::handler))
                .push(Router::with_path("account/logout").post(account::logout::handler))
                .push(Router::with_path("terms").post(terms::accept_terms::handler)),
        )
        .push(
            Router::new()
                .hoop(auth::middleware::require_terms)
                .push(request_token_router())
                .push(submit_token_router(|route| {
                    route.post(validation::submit_token::handler)
                }))
                .push(validated_threepid_router())
                .push(Router::with_path("hash_details").get(associations::hash_details::handler))
                .push(Router::with_path("lookup").post(associations::hashed_lookup::handler))
                .push(Router::with_path("3pid/bind").post(associations::bind::handler))
                .push(Router::with_path("3pid/unbind").post(associations::unbind::handler)),
        )
}

fn v1_router() -> Router {
    Router::with_path(V1_PREFIX)
        .get(status::handler)
        .push(Router::with_path("lookup").get(associations::lookup::handler))
        .push(Router::with_path("bulk_lookup").post(associations::bulk_lookup::handler))
        .push(pubkey_router())
        .push(request_token_router())
        .push(submit_token_router(|route| {
            route
                .get(validation::submit_token::handler)
                .post(validation::submit_token::handler)
        }))
        .push(validated_threepid_router())
}

fn pubkey_router() -> Router {
    Router::with_path("pubkey")
        .push(Router::with_path("isvalid").get(pubkey::is_valid::handler))
        .push(Router::with_path("{key_id}").get(pubkey::get_key::handler))
}

fn request_token_router() -> Router {
    Router::with_path("validate")
        .push(Router::with_path("email/requestToken").post(validation::request_email_token::handler))
        .push(
            Router::with_path("msisdn/requestToken").post(validation::request_msisdn_token::handler),
        )
}

/// `submitToken` for both media, with `methods` attaching the handler.
fn submit_token_router(methods: impl Fn(Router) -> Router) -> Router {
    Router::with_path("validate")
        .push(methods(Router::with_path("email/submitToken")))
        .push(methods(Router::with_path("msisdn/submitToken")))
}

fn validated_threepid_router() -> Router {
    Router::with_path("3pid/getValidated3pid").get(validation::validated_threepid::handler)
}

/// Renders unmatched routes as `M_UNRECOGNIZED` instead of an HTML page.
///
/// The status set by routing (404 or 405) is kept.
#[handler]
async fn unrecognized(res: &mut Response, ctrl: &mut FlowCtrl) {
    let Some(status @ (StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED)) = res.status_code
    else {
        return;
    };

    if res.body.is_none() {
        res.render(MatrixError::new(status, "M_UNRECOGNIZED", "Unrecognized request"));
        ctrl.skip_rest();
    }
}

pub(crate) fn catcher() -> Catcher {
    Catcher::default().hoop(unrecognized)
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        http::header::AUTHORIZATION,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use tessera_app::domain::{
        accounts::{MockAccountsService, records::AccountRecord},
        associations::{HashDetails, LookupAlgorithm, MockAssociationsService},
        sessions::{
            MockSessionsService,
            data::{RequestedToken, ValidatedThreepid},
        },
        threepids::Medium,
    };

    use crate::{errors::ErrorBody, test_helpers::TestState};

    use super::*;

    fn make_service(state: TestState, enable_v1: bool) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state.build()))
                .push(app_router(enable_v1)),
        )
        .catcher(catcher())
    }

    fn no_auth() -> MockAccountsService {
        let mut accounts = MockAccountsService::new();

        accounts.expect_authenticate().never();

        accounts
    }

    #[tokio::test]
    async fn v2_status_is_empty_object() -> TestResult {
        let mut res = TestClient::get("http://example.com/_matrix/identity/v2")
            .send(&make_service(TestState::new(), false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({}));

        Ok(())
    }

    #[tokio::test]
    async fn v1_is_unrecognized_when_disabled() -> TestResult {
        let mut res = TestClient::get("http://example.com/_matrix/identity/api/v1/lookup?medium=email&address=a@b.c")
            .send(&make_service(TestState::new(), false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_UNRECOGNIZED");

        Ok(())
    }

    fn authenticates_alice() -> MockAccountsService {
        let mut accounts = MockAccountsService::new();

        accounts
            .expect_authenticate()
            .withf(|token, require_terms| token == "abc123" && *require_terms)
            .returning(|_, _| {
                Ok(AccountRecord {
                    user_id: "@alice:hs.example".to_string(),
                    created_ts: 0,
                    consent_version: None,
                })
            });

        accounts
    }

    #[tokio::test]
    async fn v2_hash_details_works_without_v1() -> TestResult {
        let mut associations = MockAssociationsService::new();

        associations.expect_hash_details().once().return_once(|| {
            Ok(HashDetails {
                algorithms: LookupAlgorithm::ALL.to_vec(),
                lookup_pepper: "matrixrocks".to_string(),
            })
        });

        let state = TestState::new()
            .accounts(authenticates_alice())
            .associations(associations);

        let mut res = TestClient::get("http://example.com/_matrix/identity/v2/hash_details")
            .add_header(AUTHORIZATION, "Bearer abc123", true)
            .send(&make_service(state, false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"algorithms": ["none", "sha256"], "lookup_pepper": "matrixrocks"})
        );

        Ok(())
    }

    #[tokio::test]
    async fn v2_lookup_works_without_v1() -> TestResult {
        let mut associations = MockAssociationsService::new();

        associations
            .expect_hashed_lookup()
            .once()
            .withf(|request| request.algorithm == LookupAlgorithm::None)
            .return_once(|_| {
                Ok([(
                    "alice@example.org email".to_string(),
                    "@alice:hs.example".to_string(),
                )]
                .into())
            });

        let state = TestState::new()
            .accounts(authenticates_alice())
            .associations(associations);

        let mut res = TestClient::post("http://example.com/_matrix/identity/v2/lookup")
            .add_header(AUTHORIZATION, "Bearer abc123", true)
            .json(&json!({
                "addresses": ["alice@example.org email"],
                "algorithm": "none",
                "pepper": "matrixrocks",
            }))
            .send(&make_service(state, false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"mappings": {"alice@example.org email": "@alice:hs.example"}})
        );

        Ok(())
    }

    #[tokio::test]
    async fn v2_lookup_requires_access_token() -> TestResult {
        let mut associations = MockAssociationsService::new();

        associations.expect_hashed_lookup().never();

        let res = TestClient::post("http://example.com/_matrix/identity/v2/lookup")
            .json(&json!({"addresses": [], "algorithm": "none", "pepper": "p"}))
            .send(&make_service(
                TestState::new().accounts(no_auth()).associations(associations),
                false,
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn wrong_method_keeps_405() -> TestResult {
        let mut res = TestClient::delete("http://example.com/_matrix/identity/v2/terms")
            .send(&make_service(TestState::new(), false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::METHOD_NOT_ALLOWED));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_UNRECOGNIZED");

        Ok(())
    }

    #[tokio::test]
    async fn v2_bind_requires_access_token() -> TestResult {
        let mut res = TestClient::post("http://example.com/_matrix/identity/v2/3pid/bind")
            .json(&json!({"sid": "1", "client_secret": "secret", "mxid": "@alice:hs.example"}))
            .send(&make_service(TestState::new().accounts(no_auth()), false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        let body: ErrorBody = res.take_json().await?;

        assert_eq!(body.errcode, "M_UNAUTHORIZED");

        Ok(())
    }

    #[tokio::test]
    async fn v2_request_token_requires_access_token() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions.expect_request_token().never();

        let res = TestClient::post("http://example.com/_matrix/identity/v2/validate/email/requestToken")
            .json(&json!({"email": "a@b.c", "client_secret": "secret", "send_attempt": 1}))
            .send(&make_service(
                TestState::new().accounts(no_auth()).sessions(sessions),
                false,
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn v2_submit_token_link_needs_no_access_token() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions.expect_submit_token().once().return_once(|_, _, _| {
            Ok(ValidatedThreepid {
                medium: Medium::Email,
                address: "a@b.c".to_string(),
                validated_at: 0,
            })
        });

        let res = TestClient::get(
            "http://example.com/_matrix/identity/v2/validate/email/submitToken?sid=1&client_secret=secret&token=123456",
        )
        .send(&make_service(
            TestState::new().accounts(no_auth()).sessions(sessions),
            false,
        ))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn v1_request_token_needs_no_access_token() -> TestResult {
        let mut sessions = MockSessionsService::new();

        sessions.expect_request_token().once().return_once(|_| {
            Ok(RequestedToken {
                sid: 1,
                dispatched: true,
            })
        });

        let mut res = TestClient::post("http://example.com/_matrix/identity/api/v1/validate/msisdn/requestToken")
            .json(&json!({
                "country": "GB",
                "phone_number": "447700900123",
                "client_secret": "secret",
                "send_attempt": 1,
            }))
            .send(&make_service(
                TestState::new().accounts(no_auth()).sessions(sessions),
                true,
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({"sid": "1"}));

        Ok(())
    }

    #[tokio::test]
    async fn pubkey_isvalid_is_not_a_key_id() -> TestResult {
        let mut res = TestClient::get("http://example.com/_matrix/identity/v2/pubkey/isvalid?public_key=nope")
            .send(&make_service(TestState::new(), false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({"valid": false}));

        Ok(())
    }
}
