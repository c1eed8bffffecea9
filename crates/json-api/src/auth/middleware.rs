//! Auth middleware.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};

use crate::{auth::into_matrix_error, errors::MatrixError, extensions::*, state::State};

/// Authenticate and require the current terms to be agreed.
#[salvo::handler]
pub(crate) async fn require_terms(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    authenticate(req, depot, res, ctrl, true).await;
}

/// Authenticate without checking terms, for the terms and account endpoints.
#[salvo::handler]
pub(crate) async fn without_terms(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    authenticate(req, depot, res, ctrl, false).await;
}

async fn authenticate(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
    terms_required: bool,
) {
    let Some(token) = extract_access_token(req) else {
        res.render(MatrixError::unauthorized("Unauthorized"));
        ctrl.skip_rest();

        return;
    };

    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => state.clone(),
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    match state.app.accounts.authenticate(&token, terms_required).await {
        Ok(account) => depot.insert_user_id(account.user_id),
        Err(error) => {
            res.render(into_matrix_error(error));
            ctrl.skip_rest();

            return;
        }
    }

    ctrl.call_next(req, depot, res).await;
}

/// Access token from `Authorization: Bearer` or the `access_token` query argument.
pub(crate) fn extract_access_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get(AUTHORIZATION) {
        let value = value.to_str().ok()?;
        let mut parts = value.splitn(2, ' ');

        let scheme = parts.next()?;
        let token = parts.next()?.trim();

        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }

        return Some(token.to_string());
    }

    req.query::<String>("access_token")
        .filter(|token| !token.is_empty())
}
