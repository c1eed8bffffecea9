//! Public Key Validity Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;

use crate::{errors::MatrixError, extensions::*, pubkey::IsValidResponse, state::State};

#[derive(Debug, Deserialize)]
struct IsValidQuery {
    public_key: String,
}

/// Whether `public_key` is one of this server's long-term keys.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<IsValidResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let query: IsValidQuery = Params::from_query(req).parse(&["public_key"])?;

    Ok(Json(IsValidResponse {
        valid: state.app.keyring.is_own_public_key(&query.public_key),
    }))
}
