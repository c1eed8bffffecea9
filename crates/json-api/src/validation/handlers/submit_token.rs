//! Submit Token Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};

use tessera_app::domain::{sessions::records::SessionId, threepids::validate_client_secret};

use crate::{errors::MatrixError, extensions::*, state::State, validation::into_matrix_error};

/// Submit Token Request
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitTokenRequest {
    #[serde(deserialize_with = "params::session_id")]
    pub sid: SessionId,
    pub client_secret: String,
    pub token: String,
}

/// Validate a session with the token that was sent to its threepid.
///
/// Accepts a JSON body on `POST` and query arguments on `GET`, which is
/// what a link in a validation email produces.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<Map<String, Value>>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: SubmitTokenRequest = Params::from_request(req)
        .await?
        .parse(&["sid", "client_secret", "token"])?;

    validate_client_secret(&request.client_secret)?;

    state
        .app
        .sessions
        .submit_token(request.sid, &request.client_secret, &request.token)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(Map::new()))
}
