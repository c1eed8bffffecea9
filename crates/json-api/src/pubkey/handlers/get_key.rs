//! Get Public Key Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::MatrixError, extensions::*, state::State};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PublicKeyResponse {
    pub public_key: String,
}

/// The unpadded base64 public key for `key_id`.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PublicKeyResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let key_id = req.param::<String>("key_id").unwrap_or_default();

    if key_id != state.app.keyring.key_id() {
        return Err(MatrixError::not_found("The specified key was not found"));
    }

    Ok(Json(PublicKeyResponse {
        public_key: state.app.keyring.public_key_base64(),
    }))
}
