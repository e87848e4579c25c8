//! Ticket actions triggered from the chat client: escalate, mark urgent, resolve.

use tracing::{info, instrument};

use super::{notification, notify};
use crate::{
    base::{
        error::TicketError,
        types::{Priority, Res, Ticket, TicketId, TicketMessage, TicketStatus, Void},
    },
    runtime::Runtime,
};

/// Check a review rating is present and within `1..=5`.
pub fn validate_rating(rating: Option<i64>) -> Result<u8, TicketError> {
    match rating {
        Some(r @ 1..=5) => Ok(r as u8),
        Some(_) => Err(TicketError::Validation("Rating must be between 1 and 5.".to_string())),
        None => Err(TicketError::Validation("Rating is required.".to_string())),
    }
}

/// Hand the ticket to a human: notify the escalation recipient, then mark it `escalated`.
///
/// The edge is checked up front so an illegal escalation sends nothing.
#[instrument(skip(runtime))]
pub async fn escalate_ticket(ticket_id: TicketId, runtime: &Runtime) -> Void {
    let ticket = runtime.db.get_ticket(ticket_id).await?;
    ticket.status.transition(ticket_id, TicketStatus::Escalated)?;

    let messages = runtime.db.get_messages(ticket_id).await?;

    notify(&runtime.mail, &notification::escalation(&runtime.config.routing.escalation_recipient, &ticket, &messages)).await?;

    runtime.db.set_status(ticket_id, TicketStatus::Escalated).await?;

    info!("Ticket #{ticket_id} escalated.");

    Ok(())
}

#[instrument(skip(runtime))]
pub async fn mark_urgent(ticket_id: TicketId, runtime: &Runtime) -> Void {
    runtime.db.set_priority(ticket_id, Priority::Urgent).await
}

/// Store the review and resolve, then report the final stored state.
#[instrument(skip(runtime, comment))]
pub async fn resolve_ticket(ticket_id: TicketId, rating: u8, comment: Option<String>, runtime: &Runtime) -> Void {
    runtime.db.resolve(ticket_id, rating, comment.as_deref()).await?;

    let ticket = runtime.db.get_ticket(ticket_id).await?;
    let messages = runtime.db.get_messages(ticket_id).await?;

    notify(&runtime.mail, &notification::resolution(&runtime.config.routing.resolution_recipient, &ticket, &messages)).await?;

    info!("Ticket #{ticket_id} resolved and reviewed.");

    Ok(())
}

/// Load a ticket with its transcript.
#[instrument(skip(runtime))]
pub async fn ticket_details(ticket_id: TicketId, runtime: &Runtime) -> Res<(Ticket, Vec<TicketMessage>)> {
    let ticket = runtime.db.get_ticket(ticket_id).await?;
    let messages = runtime.db.get_messages(ticket_id).await?;

    Ok((ticket, messages))
}

// Tests.
