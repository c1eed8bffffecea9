//! Accounts Repository

use sqlx::{FromRow, Row, Sqlite, Transaction, query, query_as, sqlite::SqliteRow};

use crate::domain::accounts::records::AccountRecord;

const CREATE_ACCOUNT_SQL: &str = include_str!("sql/create_account.sql");
const GET_ACCOUNT_SQL: &str = include_str!("sql/get_account.sql");
const CREATE_TOKEN_SQL: &str = include_str!("sql/create_token.sql");
const GET_ACCOUNT_BY_TOKEN_SQL: &str = include_str!("sql/get_account_by_token.sql");
const DELETE_TOKEN_SQL: &str = include_str!("sql/delete_token.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct SqliteAccountsRepository;

impl SqliteAccountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Returns whether a new account was created.
    pub(crate) async fn create_account(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        created_ts: i64,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(CREATE_ACCOUNT_SQL)
            .bind(user_id)
            .bind(created_ts)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub(crate) async fn get_account(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
    ) -> Result<AccountRecord, sqlx::Error> {
        query_as::<Sqlite, AccountRecord>(GET_ACCOUNT_SQL)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_token(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        token_hash: &str,
        user_id: &str,
        created_ts: i64,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_TOKEN_SQL)
            .bind(token_hash)
            .bind(user_id)
            .bind(created_ts)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn get_account_by_token(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        token_hash: &str,
    ) -> Result<AccountRecord, sqlx::Error> {
        query_as::<Sqlite, AccountRecord>(GET_ACCOUNT_BY_TOKEN_SQL)
            .bind(token_hash)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_token(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        token_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_TOKEN_SQL)
            .bind(token_hash)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, SqliteRow> for AccountRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            created_ts: row.try_get("created_ts")?,
            consent_version: row.try_get("consent_version")?,
        })
    }
}
