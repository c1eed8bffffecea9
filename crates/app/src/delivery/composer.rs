//! Turns a [`TokenMessage`] into something a channel can send.

use std::collections::BTreeMap;

use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use serde::Serialize;

use crate::{
    clock::Clock,
    delivery::{
        TokenMessage,
        renderer::{RenderError, Renderer},
    },
    domain::threepids::Medium,
};

/// Email body used when no template file is configured.
pub const DEFAULT_EMAIL_TEMPLATE: &str = "\
From: %(from)s
To: %(to)s
Subject: %(subject)s
Message-ID: %(messageid)s
Content-Type: text/plain; charset=\"UTF-8\"

Your validation code is %(token)s
";

pub const DEFAULT_EMAIL_FROM: &str = "Tessera Validation <noreply@localhost>";
pub const DEFAULT_EMAIL_SUBJECT: &str = "Your Validation Token";
pub const DEFAULT_SMS_TEMPLATE: &str = "Your code is {token}";

/// A rendered message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub medium: Medium,
    pub to: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub body: String,
}

#[derive(Debug, Clone)]
pub struct MessageComposer {
    pub server_name: String,
    pub email_from: String,
    pub email_subject: String,
    pub email_template: Renderer,
    pub sms_template: String,
}

impl MessageComposer {
    /// Composer using the built-in templates.
    #[must_use]
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            email_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            email_template: Renderer::Legacy(DEFAULT_EMAIL_TEMPLATE.to_string()),
            sms_template: DEFAULT_SMS_TEMPLATE.to_string(),
        }
    }

    /// Render `message` for its medium.
    ///
    /// # Errors
    ///
    /// Returns an error when the email template cannot be rendered.
    pub fn compose(
        &self,
        message: &TokenMessage,
        clock: &dyn Clock,
    ) -> Result<OutgoingMessage, RenderError> {
        match message.medium {
            Medium::Email => {
                let vars = self.email_vars(message, clock);

                Ok(OutgoingMessage {
                    medium: Medium::Email,
                    to: message.address.clone(),
                    from: Some(self.email_from.clone()),
                    subject: Some(self.email_subject.clone()),
                    body: self.email_template.render(&vars)?,
                })
            }
            Medium::Msisdn => Ok(OutgoingMessage {
                medium: Medium::Msisdn,
                to: message.address.clone(),
                from: None,
                subject: None,
                body: self.sms_template.replace("{token}", &message.token),
            }),
        }
    }

    fn email_vars(&self, message: &TokenMessage, clock: &dyn Clock) -> BTreeMap<&'static str, String> {
        let nonce: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();

        let boundary: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        BTreeMap::from([
            ("token", message.token.clone()),
            ("sid", message.sid.to_string()),
            ("client_secret", message.client_secret.clone()),
            ("next_link", message.next_link.clone().unwrap_or_default()),
            ("to", message.address.clone()),
            ("from", self.email_from.clone()),
            ("subject", self.email_subject.clone()),
            (
                "messageid",
                format!("<{}{nonce}@{}>", clock.now_ms(), self.server_name),
            ),
            ("multipart_boundary", boundary),
        ])
    }
}
