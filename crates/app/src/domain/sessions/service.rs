//! Sessions service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, error, info, warn};

use crate::{
    clock::Clock,
    crypto::tokens::{alphanumeric_token, constant_time_eq, numeric_token},
    database::Db,
    delivery::{Delivery, TokenMessage},
    domain::{
        sessions::{
            data::{RequestedToken, TokenRequest, ValidatedThreepid},
            errors::SessionsServiceError,
            records::{SessionId, SessionRecord},
            repository::{NewSession, SqliteSessionsRepository},
        },
        threepids::{Medium, validate_client_secret},
    },
    settings::Settings,
};

/// How to undo a session write when the token could not be delivered.
#[derive(Debug)]
enum Compensation {
    /// The session was created by this request.
    Discard,

    /// The session existed and this request replaced its token.
    Restore(Box<SessionRecord>),
}

#[derive(Clone)]
pub struct SqliteSessionsService {
    db: Db,
    settings: Arc<Settings>,
    clock: Arc<dyn Clock>,
    delivery: Arc<dyn Delivery>,
    repository: SqliteSessionsRepository,
}

impl fmt::Debug for SqliteSessionsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSessionsService")
            .field("db", &self.db)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SqliteSessionsService {
    #[must_use]
    pub fn new(
        db: Db,
        settings: Arc<Settings>,
        clock: Arc<dyn Clock>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            db,
            settings,
            clock,
            delivery,
            repository: SqliteSessionsRepository::new(),
        }
    }

    fn generate_token(&self, medium: Medium) -> String {
        match medium {
            Medium::Email => alphanumeric_token(self.settings.token_length),
            Medium::Msisdn => numeric_token(self.settings.token_length),
        }
    }

    async fn compensate(&self, sid: SessionId, token: &str, compensation: Compensation) {
        let result = async {
            let mut tx = self.db.begin().await?;

            let rows_affected = match &compensation {
                Compensation::Discard => {
                    self.repository
                        .discard_unsent_session(&mut tx, sid, token)
                        .await?
                }
                Compensation::Restore(previous) => {
                    self.repository
                        .restore_session(&mut tx, token, previous)
                        .await?
                }
            };

            tx.commit().await?;

            Ok::<u64, sqlx::Error>(rows_affected)
        }
        .await;

        match result {
            Ok(rows_affected) => {
                debug!(sid, rows_affected, ?compensation, "compensated undelivered token");
            }
            Err(error) => {
                error!(sid, error = %error, "failed to compensate undelivered token");
            }
        }
    }
}

#[async_trait]
impl SessionsService for SqliteSessionsService {
    async fn request_token(
        &self,
        request: TokenRequest,
    ) -> Result<RequestedToken, SessionsServiceError> {
        validate_client_secret(&request.client_secret)?;

        let TokenRequest {
            threepid,
            client_secret,
            send_attempt,
            next_link,
        } = request;

        let now = self.clock.now_ms();
        let send_attempt = i64::from(send_attempt);

        let mut tx = self.db.begin().await?;

        let mut existing = self
            .repository
            .find_session(&mut tx, threepid.medium, &threepid.address, &client_secret)
            .await?;

        if let Some(session) = existing.take_if(|session| {
            !session.is_validated() && session.is_expired(now, &self.settings)
        }) {
            self.repository.delete_session(&mut tx, session.id).await?;

            debug!(sid = session.id, "replacing expired session");
        }

        let (sid, token, compensation) = match existing {
            Some(session) if session.is_validated() => {
                debug!(
                    sid = session.id,
                    medium = %threepid.medium,
                    "session already validated, not resending"
                );

                return Ok(RequestedToken {
                    sid: session.id,
                    dispatched: false,
                });
            }
            Some(session) if send_attempt <= session.send_attempt => {
                debug!(
                    sid = session.id,
                    medium = %threepid.medium,
                    send_attempt,
                    "repeated token request, not resending"
                );

                return Ok(RequestedToken {
                    sid: session.id,
                    dispatched: false,
                });
            }
            Some(session) => {
                let token = self.generate_token(threepid.medium);

                self.repository
                    .resend_session(&mut tx, session.id, &token, send_attempt, now)
                    .await?;

                (session.id, token, Compensation::Restore(Box::new(session)))
            }
            None => {
                let token = self.generate_token(threepid.medium);

                let sid = self
                    .repository
                    .create_session(
                        &mut tx,
                        &NewSession {
                            medium: threepid.medium,
                            address: &threepid.address,
                            client_secret: &client_secret,
                            token: &token,
                            send_attempt,
                            mtime: now,
                        },
                    )
                    .await?;

                (sid, token, Compensation::Discard)
            }
        };

        tx.commit().await?;

        let message = TokenMessage {
            medium: threepid.medium,
            address: threepid.address,
            sid,
            token,
            client_secret,
            next_link,
        };

        if let Err(error) = self.delivery.send(&message).await {
            warn!(sid, medium = %message.medium, error = %error, "token delivery failed");

            self.compensate(sid, &message.token, compensation).await;

            return Err(error.into());
        }

        let mut tx = self.db.begin().await?;

        self.repository
            .mark_sent(&mut tx, sid, &message.token)
            .await?;

        tx.commit().await?;

        info!(sid, medium = %message.medium, send_attempt, "sent validation token");

        Ok(RequestedToken {
            sid,
            dispatched: true,
        })
    }

    async fn submit_token(
        &self,
        sid: SessionId,
        client_secret: &str,
        token: &str,
    ) -> Result<ValidatedThreepid, SessionsServiceError> {
        validate_client_secret(client_secret)?;

        let now = self.clock.now_ms();

        let mut tx = self.db.begin().await?;

        let session = self.repository.get_session(&mut tx, sid).await?;

        if !constant_time_eq(&session.client_secret, client_secret) {
            return Err(SessionsServiceError::NotFound);
        }

        if session.is_validated() {
            if !constant_time_eq(&session.token, token) {
                return Err(SessionsServiceError::IncorrectToken);
            }

            return Ok(ValidatedThreepid {
                medium: session.medium,
                address: session.address,
                validated_at: session.validated_at.unwrap_or(session.mtime),
            });
        }

        if session.is_expired(now, &self.settings) {
            return Err(SessionsServiceError::Expired);
        }

        if !constant_time_eq(&session.token, token) {
            return Err(SessionsServiceError::IncorrectToken);
        }

        let rows_affected = self
            .repository
            .mark_validated(&mut tx, sid, token, now)
            .await?;

        if rows_affected == 0 {
            return Err(SessionsServiceError::IncorrectToken);
        }

        tx.commit().await?;

        info!(sid, medium = %session.medium, "validated session");

        Ok(ValidatedThreepid {
            medium: session.medium,
            address: session.address,
            validated_at: now,
        })
    }

    async fn get_validated_threepid(
        &self,
        sid: SessionId,
        client_secret: &str,
    ) -> Result<ValidatedThreepid, SessionsServiceError> {
        validate_client_secret(client_secret)?;

        let mut tx = self.db.begin().await?;

        let session = self.repository.get_session(&mut tx, sid).await?;

        tx.commit().await?;

        validated_threepid(session, client_secret, self.clock.now_ms(), &self.settings)
    }
}

/// Check `session` is a validated, unexpired session owned by `client_secret`.
pub(crate) fn validated_threepid(
    session: SessionRecord,
    client_secret: &str,
    now_ms: i64,
    settings: &Settings,
) -> Result<ValidatedThreepid, SessionsServiceError> {
    if !constant_time_eq(&session.client_secret, client_secret) {
        return Err(SessionsServiceError::NotFound);
    }

    if !session.is_validated() {
        return Err(SessionsServiceError::NotValidated);
    }

    if session.is_expired(now_ms, settings) {
        return Err(SessionsServiceError::Expired);
    }

    Ok(ValidatedThreepid {
        medium: session.medium,
        address: session.address,
        validated_at: session.validated_at.unwrap_or(session.mtime),
    })
}

#[automock]
#[async_trait]
pub trait SessionsService: Send + Sync {
    /// Start or retry a validation session and send its token.
    async fn request_token(
        &self,
        request: TokenRequest,
    ) -> Result<RequestedToken, SessionsServiceError>;

    /// Prove ownership of a session's threepid with its token.
    async fn submit_token(
        &self,
        sid: SessionId,
        client_secret: &str,
        token: &str,
    ) -> Result<ValidatedThreepid, SessionsServiceError>;

    /// The threepid a validated session proved ownership of.
    async fn get_validated_threepid(
        &self,
        sid: SessionId,
        client_secret: &str,
    ) -> Result<ValidatedThreepid, SessionsServiceError>;
}
