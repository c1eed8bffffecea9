//! Register Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{auth::into_matrix_error, errors::MatrixError, extensions::*, state::State};

/// A freshly issued access token, under both of its historical names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RegisterResponse {
    pub token: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    matrix_server_name: String,
    access_token: String,
}

/// Exchange a homeserver-issued OpenID token for an access token.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<RegisterResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: RegisterRequest = Params::from_json_body(req)
        .await?
        .parse(&["matrix_server_name", "access_token"])?;

    let token = state
        .app
        .accounts
        .register(&request.matrix_server_name, &request.access_token)
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(RegisterResponse {
        token: token.as_str().to_string(),
        access_token: token.as_str().to_string(),
    }))
}
