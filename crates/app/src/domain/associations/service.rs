//! Associations service.

use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    clock::Clock,
    crypto::Keyring,
    database::Db,
    domain::{
        associations::{
            data::{HashDetails, HashedLookup, LookupAlgorithm},
            errors::AssociationsServiceError,
            records::{BoundThreepid, NewAssociation},
            repository::SqliteAssociationsRepository,
        },
        sessions::{
            records::SessionId, repository::SqliteSessionsRepository,
            service::validated_threepid,
        },
        threepids::{Medium, Threepid},
    },
    settings::Settings,
};

/// How long a freshly bound association stays valid.
pub const ASSOCIATION_LIFETIME_MS: i64 = 100 * 365 * 24 * 60 * 60 * 1000;

#[derive(Clone)]
pub struct SqliteAssociationsService {
    db: Db,
    settings: Arc<Settings>,
    clock: Arc<dyn Clock>,
    keyring: Arc<Keyring>,
    repository: SqliteAssociationsRepository,
    sessions: SqliteSessionsRepository,
}

impl fmt::Debug for SqliteAssociationsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteAssociationsService")
            .field("db", &self.db)
            .field("keyring", &self.keyring)
            .finish_non_exhaustive()
    }
}

impl SqliteAssociationsService {
    #[must_use]
    pub fn new(
        db: Db,
        settings: Arc<Settings>,
        clock: Arc<dyn Clock>,
        keyring: Arc<Keyring>,
    ) -> Self {
        Self {
            db,
            settings,
            clock,
            keyring,
            repository: SqliteAssociationsRepository::new(),
            sessions: SqliteSessionsRepository::new(),
        }
    }
}

#[async_trait]
impl AssociationsService for SqliteAssociationsService {
    async fn lookup(&self, threepid: &Threepid) -> Result<Option<Value>, AssociationsServiceError> {
        let now = self.clock.now_ms();

        let mut tx = self.db.begin().await?;

        let Some(record) = self
            .repository
            .find_association(&mut tx, threepid, now)
            .await?
        else {
            return Ok(None);
        };

        let mut association = record.signed_association;

        if self.settings.sign_lookups && !self.keyring.has_signed(&association)? {
            self.keyring.sign_json(&mut association)?;

            self.repository
                .update_signed_association(&mut tx, record.id, &association)
                .await?;

            debug!(
                association_id = record.id,
                origin_server = %record.origin_server,
                "countersigned relayed association"
            );
        }

        tx.commit().await?;

        Ok(Some(association))
    }

    async fn bulk_lookup(
        &self,
        threepids: &[Threepid],
    ) -> Result<Vec<BoundThreepid>, AssociationsServiceError> {
        let limit = self.settings.address_lookup_limit;

        if threepids.len() > limit {
            return Err(AssociationsServiceError::TooLarge {
                count: threepids.len(),
                limit,
            });
        }

        let now = self.clock.now_ms();

        let mut tx = self.db.begin().await?;
        let mut found = Vec::new();

        for threepid in threepids {
            if let Some(record) = self
                .repository
                .find_association(&mut tx, threepid, now)
                .await?
            {
                found.push(BoundThreepid {
                    medium: record.medium,
                    address: record.address,
                    mxid: record.mxid,
                });
            }
        }

        tx.commit().await?;

        Ok(found)
    }

    async fn hash_details(&self) -> Result<HashDetails, AssociationsServiceError> {
        let mut tx = self.db.begin().await?;

        let lookup_pepper = self.repository.lookup_pepper(&mut tx).await?;

        tx.commit().await?;

        Ok(HashDetails {
            algorithms: LookupAlgorithm::ALL.to_vec(),
            lookup_pepper,
        })
    }

    async fn hashed_lookup(
        &self,
        request: &HashedLookup,
    ) -> Result<BTreeMap<String, String>, AssociationsServiceError> {
        let limit = self.settings.address_lookup_limit;

        if request.addresses.len() > limit {
            return Err(AssociationsServiceError::TooLarge {
                count: request.addresses.len(),
                limit,
            });
        }

        let now = self.clock.now_ms();

        let mut tx = self.db.begin().await?;

        let pepper = self.repository.lookup_pepper(&mut tx).await?;

        if request.pepper != pepper {
            return Err(AssociationsServiceError::InvalidPepper);
        }

        let mut mappings = BTreeMap::new();

        match request.algorithm {
            LookupAlgorithm::None => {
                for entry in &request.addresses {
                    let Some((address, medium)) = entry.rsplit_once(' ') else {
                        continue;
                    };

                    let Ok(medium) = medium.parse::<Medium>() else {
                        continue;
                    };

                    let threepid = Threepid::for_lookup(medium, address);

                    if let Some(record) = self
                        .repository
                        .find_association(&mut tx, &threepid, now)
                        .await?
                    {
                        mappings.insert(entry.clone(), record.mxid);
                    }
                }
            }
            LookupAlgorithm::Sha256 => {
                let hashed = self
                    .repository
                    .hash_unhashed_associations(&mut tx, &pepper)
                    .await?;

                if hashed > 0 {
                    info!(hashed, "stored lookup hashes for older associations");
                }

                for hash in &request.addresses {
                    if let Some(record) = self
                        .repository
                        .find_association_by_hash(&mut tx, hash, now)
                        .await?
                    {
                        mappings.insert(hash.clone(), record.mxid);
                    }
                }
            }
        }

        tx.commit().await?;

        debug!(
            algorithm = %request.algorithm,
            requested = request.addresses.len(),
            found = mappings.len(),
            "hashed lookup"
        );

        Ok(mappings)
    }

    async fn bind(
        &self,
        sid: SessionId,
        client_secret: &str,
        mxid: &str,
        authenticated_user: &str,
    ) -> Result<Value, AssociationsServiceError> {
        if mxid != authenticated_user {
            return Err(AssociationsServiceError::MxidMismatch);
        }

        let now = self.clock.now_ms();

        let mut tx = self.db.begin().await?;

        let session = self.sessions.get_session(&mut tx, sid).await?;
        let validated = validated_threepid(session, client_secret, now, &self.settings)?;

        let not_after = now.saturating_add(ASSOCIATION_LIFETIME_MS);

        let mut association = json!({
            "medium": validated.medium,
            "address": validated.address,
            "mxid": mxid,
            "ts": now,
            "not_before": now,
            "not_after": not_after,
        });

        self.keyring.sign_json(&mut association)?;

        let stored = self
            .repository
            .put_association(
                &mut tx,
                &NewAssociation {
                    medium: validated.medium,
                    address: &validated.address,
                    mxid,
                    ts: now,
                    not_before: now,
                    not_after,
                    origin_server: self.keyring.server_name(),
                    origin_session_id: sid,
                    signed_association: &association,
                },
            )
            .await?;

        tx.commit().await?;

        info!(sid, medium = %validated.medium, user_id = mxid, ?stored, "bound threepid");

        Ok(association)
    }

    async fn unbind(
        &self,
        sid: SessionId,
        client_secret: &str,
        threepid: &Threepid,
        mxid: &str,
        authenticated_user: &str,
    ) -> Result<u64, AssociationsServiceError> {
        if mxid != authenticated_user {
            return Err(AssociationsServiceError::MxidMismatch);
        }

        let now = self.clock.now_ms();

        let mut tx = self.db.begin().await?;

        let session = self.sessions.get_session(&mut tx, sid).await?;
        let validated = validated_threepid(session, client_secret, now, &self.settings)?;

        if validated.medium != threepid.medium || validated.address != threepid.address {
            return Err(AssociationsServiceError::ThreepidMismatch);
        }

        let removed = self
            .repository
            .delete_associations(&mut tx, threepid, mxid)
            .await?;

        tx.commit().await?;

        info!(sid, medium = %threepid.medium, user_id = mxid, removed, "unbound threepid");

        Ok(removed)
    }
}

#[automock]
#[async_trait]
pub trait AssociationsService: Send + Sync {
    /// The current signed association for `threepid`, if any.
    async fn lookup(&self, threepid: &Threepid) -> Result<Option<Value>, AssociationsServiceError>;

    /// The subset of `threepids` that are bound, in request order.
    async fn bulk_lookup(
        &self,
        threepids: &[Threepid],
    ) -> Result<Vec<BoundThreepid>, AssociationsServiceError>;

    /// Algorithms and the current pepper for hashed lookups.
    async fn hash_details(&self) -> Result<HashDetails, AssociationsServiceError>;

    /// Map each bound address of `request` to its user, keyed as sent.
    async fn hashed_lookup(
        &self,
        request: &HashedLookup,
    ) -> Result<BTreeMap<String, String>, AssociationsServiceError>;

    /// Bind the threepid proven by a validated session to `mxid`.
    async fn bind(
        &self,
        sid: SessionId,
        client_secret: &str,
        mxid: &str,
        authenticated_user: &str,
    ) -> Result<Value, AssociationsServiceError>;

    /// Remove every association of `threepid` to `mxid`.
    async fn unbind(
        &self,
        sid: SessionId,
        client_secret: &str,
        threepid: &Threepid,
        mxid: &str,
        authenticated_user: &str,
    ) -> Result<u64, AssociationsServiceError>;
}
