//! Delivery channel that records messages instead of sending them.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::delivery::{Delivery, DeliveryError, TokenMessage};

#[derive(Debug, Default)]
pub(crate) struct RecordingDelivery {
    sent: Mutex<Vec<TokenMessage>>,
    fail_next: AtomicBool,
}

impl RecordingDelivery {
    /// Make the next send fail as if the relay rejected it.
    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().map_or(0, |sent| sent.len())
    }

    pub(crate) fn last_message(&self) -> Result<TokenMessage, &'static str> {
        self.sent
            .lock()
            .map_err(|_error| "delivery log poisoned")?
            .last()
            .cloned()
            .ok_or("no token has been sent")
    }

    pub(crate) fn last_token(&self) -> Result<String, &'static str> {
        Ok(self.last_message()?.token)
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(&self, message: &TokenMessage) -> Result<(), DeliveryError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DeliveryError::Rejected(503));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }

        Ok(())
    }
}
