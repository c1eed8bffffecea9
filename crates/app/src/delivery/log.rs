//! Delivery that only writes the rendered message to the log.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::{
    clock::Clock,
    delivery::{Delivery, DeliveryError, TokenMessage, composer::MessageComposer},
};

/// For development setups with no mail or SMS gateway.
#[derive(Debug, Clone)]
pub struct LogDelivery {
    composer: MessageComposer,
    clock: Arc<dyn Clock>,
}

impl LogDelivery {
    #[must_use]
    pub fn new(composer: MessageComposer, clock: Arc<dyn Clock>) -> Self {
        Self { composer, clock }
    }
}

#[async_trait]
impl Delivery for LogDelivery {
    async fn send(&self, message: &TokenMessage) -> Result<(), DeliveryError> {
        let outgoing = self.composer.compose(message, self.clock.as_ref())?;

        info!(
            medium = %outgoing.medium,
            to = %outgoing.to,
            sid = message.sid,
            body = %outgoing.body,
            "delivery disabled, logging message instead"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{clock::FixedClock, delivery::Renderer, domain::threepids::Medium};

    use super::*;

    #[tokio::test]
    async fn log_delivery_succeeds() -> TestResult {
        let delivery = LogDelivery::new(
            MessageComposer::new("id.example.org"),
            Arc::new(FixedClock::new(0)),
        );

        delivery
            .send(&TokenMessage {
                medium: Medium::Email,
                address: "alice@example.org".to_string(),
                sid: 1,
                token: "123456".to_string(),
                client_secret: "secret".to_string(),
                next_link: Some("https://example.org/done".to_string()),
            })
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn render_failure_is_reported() {
        let mut composer = MessageComposer::new("id.example.org");

        composer.email_template = Renderer::Legacy("%(nope)s".to_string());

        let delivery = LogDelivery::new(composer, Arc::new(FixedClock::new(0)));

        let result = delivery
            .send(&TokenMessage {
                medium: Medium::Email,
                address: "alice@example.org".to_string(),
                sid: 1,
                token: "123456".to_string(),
                client_secret: "secret".to_string(),
                next_link: None,
            })
            .await;

        assert!(matches!(result, Err(DeliveryError::Render(_))), "got {result:?}");
    }
}
