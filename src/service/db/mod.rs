use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Category, Priority, Res, Role, Ticket, TicketId, TicketMessage, TicketStatus, UserInfo, Void};

pub mod surreal;

// Traits.

/// Generic database client trait that clients must implement.
///
/// The store is the only writer of tickets and messages. Every call is atomic
/// on its own; no transaction spans two calls. Operations on an absent ticket
/// fail with [`TicketError::NotFound`](crate::base::error::TicketError::NotFound).
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Creates an `open`, `normal` priority ticket and returns its new identifier.
    async fn create_ticket(&self, category: Category, user: &UserInfo) -> Res<TicketId>;

    /// Appends one turn to a ticket's transcript.
    async fn append_message(&self, ticket_id: TicketId, role: Role, text: &str) -> Void;

    /// Gets a ticket by its identifier.
    async fn get_ticket(&self, ticket_id: TicketId) -> Res<Ticket>;

    /// Gets the transcript of a ticket in insertion order.
    async fn get_messages(&self, ticket_id: TicketId) -> Res<Vec<TicketMessage>>;

    /// Moves a ticket to `status`, rejecting illegal edges.
    async fn set_status(&self, ticket_id: TicketId, status: TicketStatus) -> Void;

    /// Overwrites a ticket's priority.
    async fn set_priority(&self, ticket_id: TicketId, priority: Priority) -> Void;

    /// Records the review and moves the ticket to `resolved` in one update.
    async fn resolve(&self, ticket_id: TicketId, rating: u8, comment: Option<&str>) -> Void;
}

// Structs.

/// Database client for the support desk.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}
