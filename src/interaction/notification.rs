//! Plain-text notification emails sent to the routing teams.

use crate::{
    base::types::{Category, Ticket, TicketId, TicketMessage},
    service::mail::Notification,
};

/// Render a transcript as `ROLE: text` lines.
pub fn transcript(messages: &[TicketMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn user_details(ticket: &Ticket) -> String {
    format!(
        "User Details:\nName: {}\nEmail: {}\nPhone: {}",
        ticket.user_name,
        ticket.user_email,
        ticket.user_phone.as_deref().unwrap_or("-")
    )
}

/// Announce a freshly created ticket to its team.
pub fn new_ticket(to: &str, ticket_id: TicketId, category: Category, initial_query: &str, link_base_url: &str) -> Notification {
    let link = format!("{}/{}", link_base_url.trim_end_matches('/'), ticket_id);

    Notification {
        to: to.to_string(),
        subject: format!("New Ticket #{ticket_id}: {category}"),
        text: format!("A new support ticket has been created.\n\nCategory: {category}\nInitial Query: {initial_query}\n\nView ticket: {link}"),
    }
}

/// Hand a ticket off to a human.
pub fn escalation(to: &str, ticket: &Ticket, messages: &[TicketMessage]) -> Notification {
    Notification {
        to: to.to_string(),
        subject: format!("Escalated Ticket #{} - Priority: {}", ticket.id, ticket.priority),
        text: format!(
            "A user has escalated ticket #{}.\n\n{}\n\nConversation Transcript:\n{}",
            ticket.id,
            user_details(ticket),
            transcript(messages)
        ),
    }
}

/// Report a resolved ticket together with its review.
pub fn resolution(to: &str, ticket: &Ticket, messages: &[TicketMessage]) -> Notification {
    let rating = ticket.rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
    let comment = ticket.review_comment.as_deref().unwrap_or("");

    Notification {
        to: to.to_string(),
        subject: format!("Resolved Ticket #{} - {}/5 Stars", ticket.id, rating),
        text: format!(
            "Ticket #{} has been resolved and reviewed.\n\n{}\n\nReview:\nRating: {}/5\nComment: {}\n\nConversation Transcript:\n{}",
            ticket.id,
            user_details(ticket),
            rating,
            comment,
            transcript(messages)
        ),
    }
}

// Tests.
