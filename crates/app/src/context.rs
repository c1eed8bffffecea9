//! App Context

use std::sync::Arc;

use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    clock::{Clock, SystemClock},
    crypto::Keyring,
    database::{self, Db},
    delivery::Delivery,
    domain::{
        accounts::{AccountsService, SqliteAccountsService},
        associations::{AssociationsService, SqliteAssociationsService},
        sessions::{SessionsService, SqliteSessionsService},
        terms::{SqliteTermsService, TermsService},
    },
    federation::HomeserverClient,
    settings::Settings,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to run database migrations")]
    Migrate(#[source] MigrateError),
}

/// Outbound collaborators the services are wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub delivery: Arc<dyn Delivery>,
    pub homeserver: Arc<dyn HomeserverClient>,
}

#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub keyring: Arc<Keyring>,
    pub sessions: Arc<dyn SessionsService>,
    pub associations: Arc<dyn AssociationsService>,
    pub terms: Arc<dyn TermsService>,
    pub accounts: Arc<dyn AccountsService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// Pending migrations are applied before any service is created.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or migrating fails.
    pub async fn from_database_url(
        url: &str,
        settings: Settings,
        keyring: Keyring,
        collaborators: Collaborators,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        Ok(Self::new(
            Db::new(pool),
            settings,
            keyring,
            collaborators,
            Arc::new(SystemClock),
        ))
    }

    #[must_use]
    pub fn new(
        db: Db,
        settings: Settings,
        keyring: Keyring,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Arc::new(settings);
        let keyring = Arc::new(keyring);

        Self {
            sessions: Arc::new(SqliteSessionsService::new(
                db.clone(),
                settings.clone(),
                clock.clone(),
                collaborators.delivery,
            )),
            associations: Arc::new(SqliteAssociationsService::new(
                db.clone(),
                settings.clone(),
                clock.clone(),
                keyring.clone(),
            )),
            terms: Arc::new(SqliteTermsService::new(db.clone(), settings.clone())),
            accounts: Arc::new(SqliteAccountsService::new(
                db,
                settings.clone(),
                clock,
                collaborators.homeserver,
            )),
            settings,
            keyring,
        }
    }
}
