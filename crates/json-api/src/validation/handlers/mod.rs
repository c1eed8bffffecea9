//! Validation Handlers

use serde::{Deserialize, Serialize};

pub(crate) mod request_email_token;
pub(crate) mod request_msisdn_token;
pub(crate) mod submit_token;
pub(crate) mod validated_threepid;

/// Session id of a started or retried validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RequestTokenResponse {
    pub sid: String,
}
