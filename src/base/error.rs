//! Error taxonomy for ticket operations.
//!
//! Most code propagates `anyhow` errors; a `TicketError` travels inside them
//! when the HTTP layer needs to tell the failure kinds apart.

use thiserror::Error;

use super::types::{TicketId, TicketStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    /// A required request field is missing or malformed.
    #[error("{0}")]
    Validation(String),
    /// The referenced ticket does not exist.
    #[error("Ticket #{0} not found.")]
    NotFound(TicketId),
    /// The requested status edge is not allowed.
    #[error("Ticket #{ticket_id} cannot move from `{from}` to `{to}`.")]
    InvalidTransition { ticket_id: TicketId, from: TicketStatus, to: TicketStatus },
    /// The ticket no longer accepts chat turns.
    #[error("Ticket #{0} is resolved and no longer accepts messages.")]
    TicketClosed(TicketId),
    /// The AI or email provider failed.
    #[error("Upstream service error: {0}")]
    Upstream(String),
    /// The ticket store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl TicketError {
    pub fn upstream(err: anyhow::Error) -> Self {
        Self::Upstream(format!("{err:#}"))
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }

    /// Whether the failure was caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_) | Self::InvalidTransition { .. } | Self::TicketClosed(_))
    }
}
