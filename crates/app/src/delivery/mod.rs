//! Sending validation tokens to third-party addresses.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::domain::threepids::Medium;

pub mod composer;
pub mod log;
pub mod relay;
pub mod renderer;

pub use composer::{MessageComposer, OutgoingMessage};
pub use log::LogDelivery;
pub use relay::RelayDelivery;
pub use renderer::{RenderError, Renderer};

/// A freshly issued token and where to send it.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenMessage {
    pub medium: Medium,
    pub address: String,
    pub sid: i64,
    pub token: String,
    pub client_secret: String,
    pub next_link: Option<String>,
}

impl fmt::Debug for TokenMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMessage")
            .field("medium", &self.medium)
            .field("sid", &self.sid)
            .field("token", &"**redacted**")
            .field("client_secret", &"**redacted**")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to render message")]
    Render(#[from] RenderError),

    #[error("delivery relay could not be reached")]
    Http(#[source] reqwest::Error),

    #[error("delivery relay rejected the message with status {0}")]
    Rejected(u16),
}

#[automock]
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Deliver `message` to its address.
    async fn send(&self, message: &TokenMessage) -> Result<(), DeliveryError>;
}
