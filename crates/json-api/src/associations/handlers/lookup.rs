//! Lookup Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};

use tessera_app::domain::threepids::{Medium, Threepid};

use crate::{
    associations::into_matrix_error, errors::MatrixError, extensions::*, state::State,
};

#[derive(Debug, Deserialize)]
struct LookupQuery {
    medium: String,
    address: String,
}

/// The signed association for one threepid, or an empty object.
#[handler]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> Result<Json<Value>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let query: LookupQuery = Params::from_query(req).parse(&["medium", "address"])?;

    let Ok(medium) = query.medium.parse::<Medium>() else {
        return Ok(Json(Value::Object(Map::new())));
    };

    let association = state
        .app
        .associations
        .lookup(&Threepid::for_lookup(medium, &query.address))
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(association.unwrap_or_else(|| Value::Object(Map::new()))))
}
