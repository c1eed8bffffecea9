//! Test Helpers

use crate::{
    clock::Clock,
    domain::{
        sessions::{SessionsService, data::TokenRequest, records::SessionId},
        threepids::{Medium, Threepid},
    },
    test::TestContext,
};

/// Insert an account for `user_id` created now.
pub(crate) async fn create_account(ctx: &TestContext, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO accounts (user_id, created_ts) VALUES (?1, ?2)")
        .bind(user_id)
        .bind(ctx.clock.now_ms())
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) fn email_request(address: &str, client_secret: &str, send_attempt: u32) -> TokenRequest {
    TokenRequest {
        threepid: Threepid {
            medium: Medium::Email,
            address: address.to_string(),
        },
        client_secret: client_secret.to_string(),
        send_attempt,
        next_link: None,
    }
}

/// Run an email session through request and submit, returning its id.
pub(crate) async fn validated_session(
    ctx: &TestContext,
    address: &str,
    client_secret: &str,
) -> Result<SessionId, Box<dyn std::error::Error>> {
    let requested = ctx
        .sessions
        .request_token(email_request(address, client_secret, 1))
        .await?;

    let token = ctx.delivery.last_token()?;

    ctx.sessions
        .submit_token(requested.sid, client_secret, &token)
        .await?;

    Ok(requested.sid)
}
