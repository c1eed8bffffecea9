//! Request Email Token Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;

use tessera_app::domain::{
    sessions::data::TokenRequest,
    threepids::{Medium, Threepid, validate_client_secret},
};

use crate::{
    errors::MatrixError,
    extensions::*,
    state::State,
    validation::{RequestTokenResponse, into_matrix_error},
};

/// Request Email Token Request
#[derive(Debug, Deserialize)]
pub(crate) struct RequestEmailTokenRequest {
    pub email: String,
    pub client_secret: String,
    #[serde(deserialize_with = "params::send_attempt")]
    pub send_attempt: u32,
    pub next_link: Option<String>,
}

/// Send a validation token to an email address.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<RequestTokenResponse>, MatrixError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request: RequestEmailTokenRequest = Params::from_json_body(req)
        .await?
        .parse(&["email", "client_secret", "send_attempt"])?;

    validate_client_secret(&request.client_secret)?;

    let threepid = Threepid::parse(Medium::Email, &request.email)?;

    let requested = state
        .app
        .sessions
        .request_token(TokenRequest {
            threepid,
            client_secret: request.client_secret,
            send_attempt: request.send_attempt,
            next_link: request.next_link,
        })
        .await
        .map_err(into_matrix_error)?;

    Ok(Json(RequestTokenResponse {
        sid: requested.sid.to_string(),
    }))
}
