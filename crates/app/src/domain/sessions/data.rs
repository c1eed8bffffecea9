//! Sessions Data

use crate::domain::{
    sessions::records::SessionId,
    threepids::{Medium, Threepid},
};

/// A request to send a validation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub threepid: Threepid,
    pub client_secret: String,
    pub send_attempt: u32,
    pub next_link: Option<String>,
}

/// Outcome of a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedToken {
    pub sid: SessionId,

    /// False when the request was a retry and no token was sent.
    pub dispatched: bool,
}

/// A threepid whose ownership has been proven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedThreepid {
    pub medium: Medium,
    pub address: String,
    pub validated_at: i64,
}
