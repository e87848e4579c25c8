//! Ticket orchestration for the support desk.
//!
//! This module coordinates the services (LLM, database, mail) per request:
//! - Chat turns that open or extend a ticket
//! - Escalation, urgency, and resolution of a ticket
//! - Rendering of the notification emails
//!
//! Notifications are a best-effort side effect: a failed send is logged and
//! reported to the caller, but the writes made before it stay in place.

pub mod chat_turn;
pub mod notification;
pub mod ticket_action;

use tracing::error;

use crate::{
    base::{error::TicketError, types::Void},
    service::mail::{MailClient, Notification},
};

/// Send a notification, logging and tagging any failure as an upstream error.
async fn notify(mail: &MailClient, notification: &Notification) -> Void {
    if let Err(err) = mail.send(notification).await {
        error!("Notification `{}` to {} failed: {err:#}", notification.subject, notification.to);
        return Err(TicketError::upstream(err).into());
    }

    Ok(())
}
