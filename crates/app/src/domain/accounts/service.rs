//! Accounts service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    crypto::tokens::AccessToken,
    database::Db,
    domain::accounts::{
        errors::AccountsServiceError, records::AccountRecord,
        repository::SqliteAccountsRepository,
    },
    federation::{HomeserverClient, ServerName, server_name::user_id_server},
    settings::Settings,
};

#[derive(Clone)]
pub struct SqliteAccountsService {
    db: Db,
    settings: Arc<Settings>,
    clock: Arc<dyn Clock>,
    homeserver: Arc<dyn HomeserverClient>,
    repository: SqliteAccountsRepository,
}

impl fmt::Debug for SqliteAccountsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteAccountsService")
            .field("db", &self.db)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SqliteAccountsService {
    #[must_use]
    pub fn new(
        db: Db,
        settings: Arc<Settings>,
        clock: Arc<dyn Clock>,
        homeserver: Arc<dyn HomeserverClient>,
    ) -> Self {
        Self {
            db,
            settings,
            clock,
            homeserver,
            repository: SqliteAccountsRepository::new(),
        }
    }

    fn homeserver_allowed(&self, server: &ServerName, matrix_server_name: &str) -> bool {
        self.settings.homeserver_allowed(matrix_server_name)
            || self.settings.homeserver_allowed(server.host())
    }
}

#[async_trait]
impl AccountsService for SqliteAccountsService {
    async fn register(
        &self,
        matrix_server_name: &str,
        openid_token: &str,
    ) -> Result<AccessToken, AccountsServiceError> {
        let server: ServerName = matrix_server_name.parse()?;

        if !self.homeserver_allowed(&server, matrix_server_name) {
            warn!(server = matrix_server_name, "registration from homeserver outside allow list");

            return Err(AccountsServiceError::HomeserverNotAllowed(
                matrix_server_name.to_string(),
            ));
        }

        let userinfo = self
            .homeserver
            .openid_userinfo(&server, openid_token)
            .await?;

        if user_id_server(&userinfo.sub) != Some(matrix_server_name) {
            return Err(AccountsServiceError::ForeignUser {
                sub: userinfo.sub,
                server_name: matrix_server_name.to_string(),
            });
        }

        let now = self.clock.now_ms();
        let token = AccessToken::generate();

        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_account(&mut tx, &userinfo.sub, now)
            .await?;

        self.repository
            .create_token(&mut tx, &token.hash(), &userinfo.sub, now)
            .await?;

        tx.commit().await?;

        info!(user_id = %userinfo.sub, created, "issued access token");

        Ok(token)
    }

    async fn authenticate(
        &self,
        token: &str,
        require_terms: bool,
    ) -> Result<AccountRecord, AccountsServiceError> {
        let token_hash = AccessToken::from_raw(token).hash();

        let mut tx = self.db.begin().await?;

        let account = self
            .repository
            .get_account_by_token(&mut tx, &token_hash)
            .await?;

        tx.commit().await?;

        if require_terms
            && let Some(master_version) = self.settings.terms.master_version()
            && account.consent_version.as_deref() != Some(master_version)
        {
            return Err(AccountsServiceError::TermsNotSigned);
        }

        Ok(account)
    }

    async fn get_account(&self, user_id: &str) -> Result<AccountRecord, AccountsServiceError> {
        let mut tx = self.db.begin().await?;

        let account = self.repository.get_account(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(account)
    }

    async fn logout(&self, token: &str) -> Result<(), AccountsServiceError> {
        let token_hash = AccessToken::from_raw(token).hash();

        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_token(&mut tx, &token_hash).await?;

        if rows_affected == 0 {
            return Err(AccountsServiceError::Unauthorized);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait AccountsService: Send + Sync {
    /// Register (or re-register) the owner of a homeserver-issued OpenID token.
    async fn register(
        &self,
        matrix_server_name: &str,
        openid_token: &str,
    ) -> Result<AccessToken, AccountsServiceError>;

    /// Resolve an access token to its account.
    ///
    /// With `require_terms`, accounts that have not consented to the current
    /// terms are refused.
    async fn authenticate(
        &self,
        token: &str,
        require_terms: bool,
    ) -> Result<AccountRecord, AccountsServiceError>;

    /// Fetch an account by user id.
    async fn get_account(&self, user_id: &str) -> Result<AccountRecord, AccountsServiceError>;

    /// Revoke an access token.
    async fn logout(&self, token: &str) -> Result<(), AccountsServiceError>;
}
