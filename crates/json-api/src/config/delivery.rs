//! Delivery Config

use std::path::PathBuf;

use clap::Args;

use tessera_app::delivery::{
    MessageComposer, Renderer,
    composer::{DEFAULT_EMAIL_FROM, DEFAULT_EMAIL_SUBJECT, DEFAULT_SMS_TEMPLATE},
};

/// Token delivery settings.
#[derive(Debug, Args)]
pub struct DeliveryConfig {
    /// Relay endpoint that sends email and SMS; tokens are only logged when unset
    #[arg(long, env = "DELIVERY_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Email template, `.j2` files use the Jinja-style syntax
    #[arg(long, env = "EMAIL_TEMPLATE_PATH")]
    pub email_template_path: Option<PathBuf>,

    /// Sender of validation emails
    #[arg(long, env = "EMAIL_FROM", default_value = DEFAULT_EMAIL_FROM)]
    pub email_from: String,

    /// Subject of validation emails
    #[arg(long, env = "EMAIL_SUBJECT", default_value = DEFAULT_EMAIL_SUBJECT)]
    pub email_subject: String,

    /// Body of validation text messages
    #[arg(long, env = "SMS_BODY_TEMPLATE", default_value = DEFAULT_SMS_TEMPLATE)]
    pub sms_body_template: String,
}

impl DeliveryConfig {
    /// Build the message composer for `server_name`.
    ///
    /// # Errors
    ///
    /// Returns an error when the email template cannot be read.
    pub(crate) fn composer(&self, server_name: &str) -> Result<MessageComposer, std::io::Error> {
        let mut composer = MessageComposer::new(server_name);

        if let Some(path) = &self.email_template_path {
            composer.email_template = Renderer::load(path)?;
        }

        composer.email_from.clone_from(&self.email_from);
        composer.email_subject.clone_from(&self.email_subject);
        composer.sms_template.clone_from(&self.sms_body_template);

        Ok(composer)
    }
}
