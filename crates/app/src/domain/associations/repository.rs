//! Associations Repository

use serde_json::Value;
use sqlx::{FromRow, Row, Sqlite, Transaction, query, query_as, query_scalar, sqlite::SqliteRow};

use crate::{
    crypto::tokens::alphanumeric_token,
    domain::{
        associations::{
            data::lookup_hash,
            records::{AssociationRecord, NewAssociation},
        },
        threepids::{Medium, Threepid},
    },
};

const FIND_ASSOCIATION_SQL: &str = include_str!("sql/find_association.sql");
const PUT_ASSOCIATION_SQL: &str = include_str!("sql/put_association.sql");
const UPDATE_SIGNED_ASSOCIATION_SQL: &str = include_str!("sql/update_signed_association.sql");
const DELETE_ASSOCIATIONS_SQL: &str = include_str!("sql/delete_associations.sql");
const LOOKUP_PEPPER_SQL: &str = include_str!("sql/lookup_pepper.sql");
const FIND_ASSOCIATION_BY_HASH_SQL: &str = include_str!("sql/find_association_by_hash.sql");
const FIND_UNHASHED_ASSOCIATIONS_SQL: &str = include_str!("sql/find_unhashed_associations.sql");
const SET_LOOKUP_HASH_SQL: &str = include_str!("sql/set_lookup_hash.sql");

const LOOKUP_PEPPER_LENGTH: usize = 32;

#[derive(Debug, Clone, Default)]
pub(crate) struct SqliteAssociationsRepository;

impl SqliteAssociationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Newest association for `threepid` whose validity window covers `now_ms`.
    pub(crate) async fn find_association(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        threepid: &Threepid,
        now_ms: i64,
    ) -> Result<Option<AssociationRecord>, sqlx::Error> {
        query_as::<Sqlite, AssociationRecord>(FIND_ASSOCIATION_SQL)
            .bind(threepid.medium.as_str())
            .bind(&threepid.address)
            .bind(now_ms)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Store an association, replacing an older one from the same origin session.
    ///
    /// Returns `None` when a newer association from that session is already stored.
    pub(crate) async fn put_association(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        association: &NewAssociation<'_>,
    ) -> Result<Option<i64>, sqlx::Error> {
        let signed_association = serde_json::to_string(association.signed_association)
            .map_err(|error| sqlx::Error::Encode(Box::new(error)))?;

        let pepper = self.lookup_pepper(tx).await?;

        query_scalar::<Sqlite, i64>(PUT_ASSOCIATION_SQL)
            .bind(association.medium.as_str())
            .bind(association.address)
            .bind(association.mxid)
            .bind(association.ts)
            .bind(association.not_before)
            .bind(association.not_after)
            .bind(association.origin_server)
            .bind(association.origin_session_id)
            .bind(signed_association)
            .bind(lookup_hash(association.address, association.medium, &pepper))
            .fetch_optional(&mut **tx)
            .await
    }

    /// The pepper mixed into every lookup hash, created on first use.
    pub(crate) async fn lookup_pepper(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<String, sqlx::Error> {
        query_scalar::<Sqlite, String>(LOOKUP_PEPPER_SQL)
            .bind(alphanumeric_token(LOOKUP_PEPPER_LENGTH))
            .fetch_one(&mut **tx)
            .await
    }

    /// Newest current association stored under `hash`.
    pub(crate) async fn find_association_by_hash(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        hash: &str,
        now_ms: i64,
    ) -> Result<Option<AssociationRecord>, sqlx::Error> {
        query_as::<Sqlite, AssociationRecord>(FIND_ASSOCIATION_BY_HASH_SQL)
            .bind(hash)
            .bind(now_ms)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fill in the lookup hash of associations stored without one.
    pub(crate) async fn hash_unhashed_associations(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        pepper: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows = query_as::<Sqlite, (i64, String, String)>(FIND_UNHASHED_ASSOCIATIONS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        let mut hashed = 0;

        for (id, medium, address) in rows {
            let medium = medium
                .parse::<Medium>()
                .map_err(|error| sqlx::Error::ColumnDecode {
                    index: "medium".to_string(),
                    source: Box::new(error),
                })?;

            hashed += query(SET_LOOKUP_HASH_SQL)
                .bind(id)
                .bind(lookup_hash(&address, medium, pepper))
                .execute(&mut **tx)
                .await?
                .rows_affected();
        }

        Ok(hashed)
    }

    pub(crate) async fn update_signed_association(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        signed_association: &Value,
    ) -> Result<u64, sqlx::Error> {
        let signed_association = serde_json::to_string(signed_association)
            .map_err(|error| sqlx::Error::Encode(Box::new(error)))?;

        let rows_affected = query(UPDATE_SIGNED_ASSOCIATION_SQL)
            .bind(id)
            .bind(signed_association)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_associations(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        threepid: &Threepid,
        mxid: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ASSOCIATIONS_SQL)
            .bind(threepid.medium.as_str())
            .bind(&threepid.address)
            .bind(mxid)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, SqliteRow> for AssociationRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let medium: String = row.try_get("medium")?;
        let signed_association: String = row.try_get("signed_association")?;

        Ok(Self {
            id: row.try_get("id")?,
            medium: medium
                .parse::<Medium>()
                .map_err(|error| sqlx::Error::ColumnDecode {
                    index: "medium".to_string(),
                    source: Box::new(error),
                })?,
            address: row.try_get("address")?,
            mxid: row.try_get("mxid")?,
            ts: row.try_get("ts")?,
            not_before: row.try_get("not_before")?,
            not_after: row.try_get("not_after")?,
            origin_server: row.try_get("origin_server")?,
            origin_session_id: row.try_get("origin_session_id")?,
            signed_association: serde_json::from_str(&signed_association).map_err(|error| {
                sqlx::Error::ColumnDecode {
                    index: "signed_association".to_string(),
                    source: Box::new(error),
                }
            })?,
        })
    }
}
