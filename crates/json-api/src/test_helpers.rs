//! Test helpers.

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use salvo::{affix_state::inject, prelude::*};

use tessera_app::{
    context::AppContext,
    crypto::Keyring,
    domain::{
        accounts::MockAccountsService, associations::MockAssociationsService,
        sessions::MockSessionsService, terms::MockTermsService,
    },
    settings::Settings,
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_SERVER_NAME: &str = "id.example.org";

pub(crate) const TEST_USER_ID: &str = "@alice:hs.example";

/// Builds a [`State`] whose services are strict mocks.
///
/// A mock without expectations fails the test on any call.
pub(crate) struct TestState {
    settings: Settings,
    sessions: MockSessionsService,
    associations: MockAssociationsService,
    terms: MockTermsService,
    accounts: MockAccountsService,
}

impl TestState {
    pub(crate) fn new() -> Self {
        Self {
            settings: Settings::new(TEST_SERVER_NAME),
            sessions: MockSessionsService::new(),
            associations: MockAssociationsService::new(),
            terms: MockTermsService::new(),
            accounts: MockAccountsService::new(),
        }
    }

    pub(crate) fn settings(mut self, configure: impl FnOnce(&mut Settings)) -> Self {
        configure(&mut self.settings);
        self
    }

    pub(crate) fn sessions(mut self, sessions: MockSessionsService) -> Self {
        self.sessions = sessions;
        self
    }

    pub(crate) fn associations(mut self, associations: MockAssociationsService) -> Self {
        self.associations = associations;
        self
    }

    pub(crate) fn terms(mut self, terms: MockTermsService) -> Self {
        self.terms = terms;
        self
    }

    pub(crate) fn accounts(mut self, accounts: MockAccountsService) -> Self {
        self.accounts = accounts;
        self
    }

    pub(crate) fn build(self) -> Arc<State> {
        let keyring = test_keyring();

        State::from_app_context(AppContext {
            settings: Arc::new(self.settings),
            keyring: Arc::new(keyring),
            sessions: Arc::new(self.sessions),
            associations: Arc::new(self.associations),
            terms: Arc::new(self.terms),
            accounts: Arc::new(self.accounts),
        })
    }
}

pub(crate) fn test_keyring() -> Keyring {
    Keyring::new(TEST_SERVER_NAME, "0", SigningKey::from_bytes(&[42; 32]))
}

/// Pretend `TEST_USER_ID` authenticated.
#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_id(TEST_USER_ID.to_string());
    ctrl.call_next(req, depot, res).await;
}

/// Service with `state` injected and `route` mounted.
pub(crate) fn service(state: Arc<State>, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(state)).push(route))
}

/// Service with `state` injected, a fixed authenticated user, and `route` mounted.
pub(crate) fn authenticated_service(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(inject_user)
            .push(route),
    )
}
