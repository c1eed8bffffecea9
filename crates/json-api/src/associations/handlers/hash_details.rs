//! Hash Details Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    associations::into_matrix_error, errors::MatrixError, extensions::*, state::State,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HashDetailsResponse {
    pub algorithms: Vec<String>,
    pub lookup_pepper: String,
}

/// Algorithms and pepper a client needs to build a hashed lookup.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<HashDetailsResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let details = state
        .app
        .associations
        .hash_details()
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(HashDetailsResponse {
        algorithms: details
            .algorithms
            .iter()
            .map(ToString::to_string)
            .collect(),
        lookup_pepper: details.lookup_pepper,
    }))
}
