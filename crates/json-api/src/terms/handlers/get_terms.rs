//! Get Terms Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde_json::Value;

use crate::{errors::MatrixError, extensions::*, state::State};

/// The published policies, keyed by document name.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Value>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    Ok(Json(state.app.terms.terms().for_client()))
}
