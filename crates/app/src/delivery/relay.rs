//! Delivery through an HTTP relay that owns the SMTP and SMS gateways.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    delivery::{Delivery, DeliveryError, TokenMessage, composer::MessageComposer},
};

/// Posts each rendered message as JSON to a relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayDelivery {
    url: String,
    http: Client,
    composer: MessageComposer,
    clock: Arc<dyn Clock>,
}

impl RelayDelivery {
    #[must_use]
    pub fn new(url: impl Into<String>, composer: MessageComposer, clock: Arc<dyn Clock>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
            composer,
            clock,
        }
    }
}

#[async_trait]
impl Delivery for RelayDelivery {
    async fn send(&self, message: &TokenMessage) -> Result<(), DeliveryError> {
        let outgoing = self.composer.compose(message, self.clock.as_ref())?;

        let response = self
            .http
            .post(&self.url)
            .json(&outgoing)
            .send()
            .await
            .map_err(DeliveryError::Http)?;

        let status = response.status();

        if !status.is_success() {
            warn!(medium = %message.medium, sid = message.sid, %status, "relay rejected message");

            return Err(DeliveryError::Rejected(status.as_u16()));
        }

        info!(medium = %message.medium, sid = message.sid, "token handed to relay");

        Ok(())
    }
}
