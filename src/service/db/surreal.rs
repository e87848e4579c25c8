//! SurrealDB implementation of the ticket store.
//!
//! Tickets live in `tickets` (record key = ticket id) and transcript turns in
//! `ticket_messages`. Both identifiers are positive integers handed out by this
//! process, seeded from the highest persisted value at start-up.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument};

use super::{DbClient, GenericDbClient};
use crate::base::{
    config::Config,
    error::TicketError,
    types::{Category, Priority, Res, Role, Ticket, TicketId, TicketMessage, TicketStatus, UserInfo, Void},
};

const TICKETS: &str = "tickets";
const TICKET_MESSAGES: &str = "ticket_messages";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connect to the configured SurrealDB endpoint.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let credentials = match (&config.db_username, &config.db_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        };

        let client = SurrealDbClient::connect(&config.db_endpoint, credentials, &config.db_namespace, &config.db_database).await?;

        Ok(Self { inner: Arc::new(client) })
    }

    /// Create a fresh in-memory store.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::connect("mem://", None, "support", "tickets").await?;

        Ok(Self { inner: Arc::new(client) })
    }
}

// Records.

/// A row of the `tickets` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TicketRecord {
    ticket_id: i64,
    user_name: String,
    user_email: String,
    user_phone: Option<String>,
    category: Option<String>,
    status: String,
    priority: String,
    rating: Option<i64>,
    review_comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRecord> for Ticket {
    type Error = TicketError;

    fn try_from(record: TicketRecord) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: record.ticket_id,
            user_name: record.user_name,
            user_email: record.user_email,
            user_phone: record.user_phone,
            category: record.category.map(|c| c.parse::<Category>()).transpose().map_err(TicketError::store)?,
            status: record.status.parse().map_err(TicketError::store)?,
            priority: record.priority.parse().map_err(TicketError::store)?,
            rating: record.rating.map(u8::try_from).transpose().map_err(TicketError::store)?,
            review_comment: record.review_comment,
            created_at: record.created_at,
        })
    }
}

/// A row of the `ticket_messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageRecord {
    message_id: i64,
    ticket_id: i64,
    role: String,
    message: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for TicketMessage {
    type Error = TicketError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        Ok(TicketMessage {
            id: record.message_id,
            ticket_id: record.ticket_id,
            role: record.role.parse().map_err(TicketError::store)?,
            message: record.message,
            timestamp: record.timestamp,
        })
    }
}

#[derive(Debug, Serialize)]
struct StatusPatch {
    status: String,
}

#[derive(Debug, Serialize)]
struct PriorityPatch {
    priority: String,
}

#[derive(Debug, Serialize)]
struct ResolvePatch {
    status: String,
    rating: i64,
    review_comment: Option<String>,
}

// Specific implementations.

/// SurrealDB ticket store.
pub struct SurrealDbClient {
    db: Surreal<Any>,
    last_ticket_id: AtomicI64,
    last_message_id: AtomicI64,
}

impl SurrealDbClient {
    /// Connect, select the namespace, and define the schema.
    #[instrument(name = "SurrealDbClient::connect", skip(credentials))]
    pub async fn connect(endpoint: &str, credentials: Option<(&str, &str)>, namespace: &str, database: &str) -> Res<Self> {
        let db = any::connect(endpoint).await?;

        // Authenticate with the database if credentials are provided (remote endpoints).
        if let Some((username, password)) = credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        // Define schemas.

        db.query(
            "DEFINE TABLE IF NOT EXISTS tickets SCHEMALESS;
             DEFINE TABLE IF NOT EXISTS ticket_messages SCHEMALESS;
             DEFINE INDEX IF NOT EXISTS ticket_messages_ticket_id ON TABLE ticket_messages COLUMNS ticket_id;",
        )
        .await?
        .check()?;

        // Seed the identifier sequences.

        let last_ticket_id = max_sequence(&db, TICKETS, "ticket_id").await?;
        let last_message_id = max_sequence(&db, TICKET_MESSAGES, "message_id").await?;

        info!("Ticket store ready (last ticket #{last_ticket_id}, last message #{last_message_id}).");

        Ok(Self {
            db,
            last_ticket_id: AtomicI64::new(last_ticket_id),
            last_message_id: AtomicI64::new(last_message_id),
        })
    }

    async fn get_ticket_record(&self, ticket_id: TicketId) -> Res<TicketRecord> {
        let record: Option<TicketRecord> = self.db.select((TICKETS, ticket_id)).await.map_err(TicketError::store)?;

        record.ok_or_else(|| TicketError::NotFound(ticket_id).into())
    }
}

/// Highest value of an integer field in a table, or zero when empty.
async fn max_sequence(db: &Surreal<Any>, table: &str, field: &str) -> Res<i64> {
    let ids: Vec<i64> = db.query(format!("SELECT VALUE {field} FROM {table}")).await?.take(0)?;

    Ok(ids.into_iter().max().unwrap_or(0))
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self, user))]
    async fn create_ticket(&self, category: Category, user: &UserInfo) -> Res<TicketId> {
        let ticket_id = self.last_ticket_id.fetch_add(1, Ordering::SeqCst) + 1;

        let record = TicketRecord {
            ticket_id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            user_phone: user.phone.clone().filter(|p| !p.trim().is_empty()),
            category: Some(category.to_string()),
            status: TicketStatus::Open.to_string(),
            priority: Priority::Normal.to_string(),
            rating: None,
            review_comment: None,
            created_at: Utc::now(),
        };

        let created: Option<TicketRecord> = self.db.create((TICKETS, ticket_id)).content(record).await.map_err(TicketError::store)?;

        if created.is_none() {
            return Err(TicketError::Store(format!("Ticket #{ticket_id} was not created.")).into());
        }

        info!("Created ticket #{ticket_id} ({category}).");

        Ok(ticket_id)
    }

    #[instrument(skip(self, text))]
    async fn append_message(&self, ticket_id: TicketId, role: Role, text: &str) -> Void {
        // Enforce the reference before writing.
        self.get_ticket_record(ticket_id).await?;

        let message_id = self.last_message_id.fetch_add(1, Ordering::SeqCst) + 1;

        let record = MessageRecord {
            message_id,
            ticket_id,
            role: role.to_string(),
            message: text.to_string(),
            timestamp: Utc::now(),
        };

        let _: Option<MessageRecord> = self.db.create((TICKET_MESSAGES, message_id)).content(record).await.map_err(TicketError::store)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_ticket(&self, ticket_id: TicketId) -> Res<Ticket> {
        let record = self.get_ticket_record(ticket_id).await?;

        Ok(Ticket::try_from(record)?)
    }

    #[instrument(skip(self))]
    async fn get_messages(&self, ticket_id: TicketId) -> Res<Vec<TicketMessage>> {
        self.get_ticket_record(ticket_id).await?;

        let records: Vec<MessageRecord> = self
            .db
            .query("SELECT * FROM ticket_messages WHERE ticket_id = $ticket_id ORDER BY message_id ASC")
            .bind(("ticket_id", ticket_id))
            .await
            .map_err(TicketError::store)?
            .take(0)
            .map_err(TicketError::store)?;

        let messages = records.into_iter().map(TicketMessage::try_from).collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn set_status(&self, ticket_id: TicketId, status: TicketStatus) -> Void {
        let current = self.get_ticket(ticket_id).await?;
        let status = current.status.transition(ticket_id, status)?;

        let _: Option<TicketRecord> = self
            .db
            .update((TICKETS, ticket_id))
            .merge(StatusPatch { status: status.to_string() })
            .await
            .map_err(TicketError::store)?;

        info!("Ticket #{ticket_id} is now `{status}`.");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_priority(&self, ticket_id: TicketId, priority: Priority) -> Void {
        self.get_ticket_record(ticket_id).await?;

        let _: Option<TicketRecord> = self
            .db
            .update((TICKETS, ticket_id))
            .merge(PriorityPatch { priority: priority.to_string() })
            .await
            .map_err(TicketError::store)?;

        info!("Ticket #{ticket_id} priority is now `{priority}`.");

        Ok(())
    }

    #[instrument(skip(self, comment))]
    async fn resolve(&self, ticket_id: TicketId, rating: u8, comment: Option<&str>) -> Void {
        let current = self.get_ticket(ticket_id).await?;
        let status = current.status.transition(ticket_id, TicketStatus::Resolved)?;

        let patch = ResolvePatch {
            status: status.to_string(),
            rating: i64::from(rating),
            review_comment: comment.map(str::to_string),
        };

        let _: Option<TicketRecord> = self.db.update((TICKETS, ticket_id)).merge(patch).await.map_err(TicketError::store)?;

        info!("Ticket #{ticket_id} resolved with rating {rating}/5.");

        Ok(())
    }
}

// Tests.
