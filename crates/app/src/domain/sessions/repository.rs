//! Sessions Repository

use sqlx::{FromRow, Row, Sqlite, Transaction, query, query_as, query_scalar, sqlite::SqliteRow};

use crate::domain::{
    sessions::records::{SessionId, SessionRecord, SessionState},
    threepids::Medium,
};

const GET_SESSION_SQL: &str = include_str!("sql/get_session.sql");
const FIND_SESSION_SQL: &str = include_str!("sql/find_session.sql");
const CREATE_SESSION_SQL: &str = include_str!("sql/create_session.sql");
const DELETE_SESSION_SQL: &str = include_str!("sql/delete_session.sql");
const RESEND_SESSION_SQL: &str = include_str!("sql/resend_session.sql");
const MARK_SESSION_SENT_SQL: &str = include_str!("sql/mark_session_sent.sql");
const MARK_SESSION_VALIDATED_SQL: &str = include_str!("sql/mark_session_validated.sql");
const RESTORE_SESSION_SQL: &str = include_str!("sql/restore_session.sql");
const DISCARD_UNSENT_SESSION_SQL: &str = include_str!("sql/discard_unsent_session.sql");

/// Columns for a session that has not been stored yet.
#[derive(Debug, Clone)]
pub(crate) struct NewSession<'a> {
    pub medium: Medium,
    pub address: &'a str,
    pub client_secret: &'a str,
    pub token: &'a str,
    pub send_attempt: i64,
    pub mtime: i64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SqliteSessionsRepository;

impl SqliteSessionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sid: SessionId,
    ) -> Result<SessionRecord, sqlx::Error> {
        query_as::<Sqlite, SessionRecord>(GET_SESSION_SQL)
            .bind(sid)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        medium: Medium,
        address: &str,
        client_secret: &str,
    ) -> Result<Option<SessionRecord>, sqlx::Error> {
        query_as::<Sqlite, SessionRecord>(FIND_SESSION_SQL)
            .bind(medium.as_str())
            .bind(address)
            .bind(client_secret)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        session: &NewSession<'_>,
    ) -> Result<SessionId, sqlx::Error> {
        query_scalar::<Sqlite, SessionId>(CREATE_SESSION_SQL)
            .bind(session.medium.as_str())
            .bind(session.address)
            .bind(session.client_secret)
            .bind(session.token)
            .bind(session.send_attempt)
            .bind(session.mtime)
            .fetch_one(&mut **tx)
            .await
    }

    /// Validated sessions are never deleted.
    pub(crate) async fn delete_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sid: SessionId,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_SESSION_SQL)
            .bind(sid)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn resend_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sid: SessionId,
        token: &str,
        send_attempt: i64,
        mtime: i64,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RESEND_SESSION_SQL)
            .bind(sid)
            .bind(token)
            .bind(send_attempt)
            .bind(mtime)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn mark_sent(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sid: SessionId,
        token: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_SESSION_SENT_SQL)
            .bind(sid)
            .bind(token)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Conditional on the session still holding `token` and not being validated.
    pub(crate) async fn mark_validated(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sid: SessionId,
        token: &str,
        validated_at: i64,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_SESSION_VALIDATED_SQL)
            .bind(sid)
            .bind(token)
            .bind(validated_at)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Put back the attempt a failed resend replaced, if nothing has moved on since.
    pub(crate) async fn restore_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        current_token: &str,
        previous: &SessionRecord,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RESTORE_SESSION_SQL)
            .bind(previous.id)
            .bind(current_token)
            .bind(&previous.token)
            .bind(previous.send_attempt)
            .bind(previous.state.as_str())
            .bind(previous.mtime)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn discard_unsent_session(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sid: SessionId,
        token: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DISCARD_UNSENT_SESSION_SQL)
            .bind(sid)
            .bind(token)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn decode_error(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl<'r> FromRow<'r, SqliteRow> for SessionRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let medium: String = row.try_get("medium")?;
        let state: String = row.try_get("state")?;

        Ok(Self {
            id: row.try_get("id")?,
            medium: medium
                .parse::<Medium>()
                .map_err(|error| decode_error("medium", error))?,
            address: row.try_get("address")?,
            client_secret: row.try_get("client_secret")?,
            token: row.try_get("token")?,
            send_attempt: row.try_get("send_attempt")?,
            state: state
                .parse::<SessionState>()
                .map_err(|error| decode_error("state", error))?,
            mtime: row.try_get("mtime")?,
            validated_at: row.try_get("validated_at")?,
        })
    }
}
