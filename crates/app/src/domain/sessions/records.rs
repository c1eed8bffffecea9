//! Session Records

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::{domain::threepids::Medium, settings::Settings};

/// Session id, allocated from a single sequence across media.
pub type SessionId = i64;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown session state {0}")]
pub struct UnknownSessionState(pub String);

/// Lifecycle of a validation session.
///
/// `Created -> Sent -> Validated`, where a resend with a higher attempt moves
/// a `Sent` session back to `Created` with a fresh token. Expiry is not
/// stored, it is derived from the timestamps when the session is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Sent,
    Validated,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Sent => "sent",
            Self::Validated => "validated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = UnknownSessionState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(Self::Created),
            "sent" => Ok(Self::Sent),
            "validated" => Ok(Self::Validated),
            other => Err(UnknownSessionState(other.to_string())),
        }
    }
}

/// Session Record
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub medium: Medium,
    pub address: String,
    pub client_secret: String,
    pub token: String,
    pub send_attempt: i64,
    pub state: SessionState,
    pub mtime: i64,
    pub validated_at: Option<i64>,
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("medium", &self.medium)
            .field("send_attempt", &self.send_attempt)
            .field("state", &self.state)
            .field("mtime", &self.mtime)
            .field("validated_at", &self.validated_at)
            .finish_non_exhaustive()
    }
}

impl SessionRecord {
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.state == SessionState::Validated
    }

    /// Whether the session is past its usable lifetime at `now_ms`.
    ///
    /// Unvalidated sessions expire `session_ttl` after they were last sent.
    /// Validated sessions expire `validated_session_lifetime` after validation.
    #[must_use]
    pub fn is_expired(&self, now_ms: i64, settings: &Settings) -> bool {
        if self.is_validated() {
            let validated_at = self.validated_at.unwrap_or(self.mtime);

            return now_ms > validated_at.saturating_add(settings.validated_session_lifetime_ms());
        }

        now_ms > self.mtime.saturating_add(settings.session_ttl_ms())
    }
}
