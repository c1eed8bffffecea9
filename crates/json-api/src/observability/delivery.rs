//! Delivery metrics.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use tessera_app::delivery::{Delivery, DeliveryError, TokenMessage};

use super::metrics;

/// Counts every send of the wrapped channel by medium and outcome.
pub(crate) struct MeteredDelivery {
    inner: Arc<dyn Delivery>,
}

impl MeteredDelivery {
    pub(crate) fn new(inner: Arc<dyn Delivery>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for MeteredDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeteredDelivery").finish_non_exhaustive()
    }
}

#[async_trait]
impl Delivery for MeteredDelivery {
    async fn send(&self, message: &TokenMessage) -> Result<(), DeliveryError> {
        let result = self.inner.send(message).await;

        let outcome = if result.is_ok() { "sent" } else { "failed" };

        metrics::observe_delivery(message.medium.as_str(), outcome);

        result
    }
}
