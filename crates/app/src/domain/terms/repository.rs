//! Terms Repository

use sqlx::{Sqlite, Transaction, query, query_scalar};

const ADD_AGREED_URL_SQL: &str = include_str!("sql/add_agreed_url.sql");
const LIST_AGREED_URLS_SQL: &str = include_str!("sql/list_agreed_urls.sql");
const SET_CONSENT_VERSION_SQL: &str = include_str!("sql/set_consent_version.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct SqliteTermsRepository;

impl SqliteTermsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn add_agreed_urls(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        urls: &[String],
    ) -> Result<(), sqlx::Error> {
        for url in urls {
            query(ADD_AGREED_URL_SQL)
                .bind(user_id)
                .bind(url)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    pub(crate) async fn list_agreed_urls(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        query_scalar::<Sqlite, String>(LIST_AGREED_URLS_SQL)
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await
    }

    /// Returns whether the stored version changed.
    pub(crate) async fn set_consent_version(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        version: &str,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(SET_CONSENT_VERSION_SQL)
            .bind(user_id)
            .bind(version)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
