//! Common types shared by every layer of the support desk.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use super::error::TicketError;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Identifier of a ticket; always positive once assigned.
pub type TicketId = i64;

// Enums.

/// Author of a single turn in a ticket transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(TicketError::Validation(format!("Unknown role `{other}`."))),
        }
    }
}

/// The fixed label set a ticket is classified into.
///
/// `Unclassified` is the fallback when the triage agent does not emit a
/// recognizable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Category {
    Website,
    Email,
    Social,
    Admin,
    Unclassified,
}

impl Category {
    /// Labels the triage agent is allowed to emit.
    pub const LABELS: [Category; 4] = [Category::Website, Category::Email, Category::Social, Category::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Website => "Website",
            Category::Email => "Email",
            Category::Social => "Social",
            Category::Admin => "Admin",
            Category::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "website" => Ok(Category::Website),
            "email" => Ok(Category::Email),
            "social" => Ok(Category::Social),
            "admin" => Ok(Category::Admin),
            "unclassified" => Ok(Category::Unclassified),
            other => Err(TicketError::Validation(format!("Unknown category `{other}`."))),
        }
    }
}

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum TicketStatus {
    Open,
    Escalated,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Escalated => "escalated",
            TicketStatus::Resolved => "resolved",
        }
    }

    /// Whether moving from `self` to `to` is a legal edge.
    ///
    /// Status only ever advances. Re-escalating and re-resolving are allowed
    /// overwrites; nothing returns to `open` and a resolved ticket cannot be
    /// escalated.
    pub fn can_transition_to(&self, to: TicketStatus) -> bool {
        use TicketStatus::*;

        matches!(
            (self, to),
            (Open, Escalated) | (Open, Resolved) | (Escalated, Escalated) | (Escalated, Resolved) | (Resolved, Resolved)
        )
    }

    /// Validate the `self -> to` edge for the given ticket.
    pub fn transition(&self, ticket_id: TicketId, to: TicketStatus) -> Result<TicketStatus, TicketError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TicketError::InvalidTransition { ticket_id, from: *self, to })
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "escalated" => Ok(TicketStatus::Escalated),
            "resolved" => Ok(TicketStatus::Resolved),
            other => Err(TicketError::Validation(format!("Unknown status `{other}`."))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Priority {
    Normal,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "urgent" => Ok(Priority::Urgent),
            other => Err(TicketError::Validation(format!("Unknown priority `{other}`."))),
        }
    }
}

// Structs.

/// Contact details collected before a chat starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserInfo {
    /// Ensure name and email are present.
    pub fn validate(&self) -> Result<(), TicketError> {
        if self.name.trim().is_empty() {
            return Err(TicketError::Validation("User name is required.".to_string()));
        }

        if self.email.trim().is_empty() {
            return Err(TicketError::Validation("User email is required.".to_string()));
        }

        Ok(())
    }
}

/// One turn of a conversation as exchanged with the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Structured output of the triage assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageReply {
    /// Reply text, verbatim.
    pub reply: String,
    /// Category label found in the reply, if any.
    pub category: Option<Category>,
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub category: Option<Category>,
    pub status: TicketStatus,
    pub priority: Priority,
    pub rating: Option<u8>,
    pub review_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single persisted turn of a ticket transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: TicketId,
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// Tests.
