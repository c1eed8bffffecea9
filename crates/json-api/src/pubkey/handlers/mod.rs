//! Public Key Handlers

use serde::{Deserialize, Serialize};

pub(crate) mod get_key;
pub(crate) mod is_valid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IsValidResponse {
    pub valid: bool,
}
