//! Bind Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use serde_json::Value;

use tessera_app::domain::{sessions::records::SessionId, threepids::validate_client_secret};

use crate::{
    associations::into_matrix_error, errors::MatrixError, extensions::*, state::State,
};

#[derive(Debug, Deserialize)]
struct BindRequest {
    #[serde(deserialize_with = "params::session_id")]
    sid: SessionId,
    client_secret: String,
    mxid: String,
}

/// Bind the threepid of a validated session to the authenticated user.
///
/// Responds with the signed association.
#[handler]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> Result<Json<Value>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user_id = depot.user_id_or_401()?;
    let request: BindRequest = Params::from_json_body(req)
        .await?
        .parse(&["sid", "client_secret", "mxid"])?;

    validate_client_secret(&request.client_secret)?;

    let association = state
        .app
        .associations
        .bind(request.sid, &request.client_secret, &request.mxid, user_id)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(association))
}
