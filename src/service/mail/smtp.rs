//! SMTP delivery through `lettre`.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info, instrument};

use super::{GenericMailClient, MailClient, Notification};
use crate::base::{
    config::Config,
    types::{Res, Void},
};

// Extra methods on `MailClient` applied by the smtp implementation.

impl MailClient {
    pub fn smtp(config: &Config) -> Res<Self> {
        let client = SmtpMailClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Specific implementations.

/// SMTP mail client implementation.
#[derive(Clone)]
pub struct SmtpMailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailClient {
    /// Create a new SMTP mail client.
    ///
    /// Port 465 uses implicit TLS; other ports use STARTTLS unless it is
    /// disabled, in which case the connection is plain (local catchers only).
    #[instrument(name = "SmtpMailClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let sender = format!("\"{}\" <{}>", config.sender_name, config.sender_email).parse::<Mailbox>()?;

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let builder = builder.port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => builder.credentials(Credentials::new(username.clone(), password.clone())),
            _ => builder,
        };

        info!("SMTP transport configured for {}:{}.", config.smtp_host, config.smtp_port);

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

/// Build the MIME message for a notification.
pub fn build_message(sender: &Mailbox, notification: &Notification) -> Res<Message> {
    let message = Message::builder()
        .from(sender.clone())
        .to(notification.to.parse::<Mailbox>()?)
        .subject(notification.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(notification.text.clone())?;

    Ok(message)
}

#[async_trait]
impl GenericMailClient for SmtpMailClient {
    #[instrument(name = "SmtpMailClient::send", skip_all, fields(to = %notification.to))]
    async fn send(&self, notification: &Notification) -> Void {
        let message = build_message(&self.sender, notification)?;

        match self.transport.send(message).await {
            Ok(response) => {
                info!("Message sent: {}", response.code());
                Ok(())
            }
            Err(err) => {
                error!("Error sending email: {err}");
                Err(err.into())
            }
        }
    }
}

// Tests.
