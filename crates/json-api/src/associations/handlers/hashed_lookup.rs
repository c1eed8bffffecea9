//! Hashed Lookup Handler

use std::{collections::BTreeMap, sync::Arc};

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use tessera_app::domain::associations::{HashedLookup, LookupAlgorithm};

use crate::{
    associations::into_matrix_error, errors::MatrixError, extensions::*, state::State,
};

#[derive(Debug, Deserialize)]
struct HashedLookupRequest {
    addresses: Vec<String>,
    algorithm: String,
    pepper: String,
}

/// Bound addresses, keyed exactly as the client sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HashedLookupResponse {
    pub mappings: BTreeMap<String, String>,
}

/// Resolve hashed or plain `"<address> <medium>"` entries to user ids.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<HashedLookupResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: HashedLookupRequest = Params::from_json_body(req)
        .await?
        .parse(&["addresses", "algorithm", "pepper"])?;

    let algorithm = request
        .algorithm
        .parse::<LookupAlgorithm>()
        .map_err(|error| MatrixError::invalid_param(error.to_string()))?;

    let mappings = state
        .app
        .associations
        .hashed_lookup(&HashedLookup {
            algorithm,
            pepper: request.pepper,
            addresses: request.addresses,
        })
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(HashedLookupResponse { mappings }))
}
