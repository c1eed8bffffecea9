//! Bulk Lookup Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use tessera_app::domain::threepids::{Medium, Threepid};

use crate::{
    associations::{errors::too_large, into_matrix_error},
    errors::MatrixError,
    extensions::*,
    state::State,
};

/// Bound threepids as `[medium, address, mxid]` triples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BulkLookupResponse {
    pub threepids: Vec<(String, String, String)>,
}

#[derive(Debug, Deserialize)]
struct BulkLookupRequest {
    threepids: Vec<(String, String)>,
}

/// Resolve many threepids at once. Unbound ones are left out.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<BulkLookupResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: BulkLookupRequest = Params::from_json_body(req).await?.parse(&["threepids"])?;

    let limit = state.app.settings.address_lookup_limit;

    if request.threepids.len() > limit {
        return Err(too_large(limit));
    }

    let threepids: Vec<Threepid> = request
        .threepids
        .iter()
        .filter_map(|(medium, address)| {
            let medium = medium.parse::<Medium>().ok()?;

            Some(Threepid::for_lookup(medium, address))
        })
        .collect();

    let found = state
        .app
        .associations
        .bulk_lookup(&threepids)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(BulkLookupResponse {
        threepids: found
            .into_iter()
            .map(|bound| (bound.medium.to_string(), bound.address, bound.mxid))
            .collect(),
    }))
}
