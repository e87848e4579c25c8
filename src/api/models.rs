//! JSON bodies of the HTTP API, shared by the server and the chat client.
//!
//! Request fields are optional at the serde level so that a missing field is
//! reported as a validation error with a readable message.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::{
    base::{
        error::TicketError,
        types::{ChatTurn, Role, Ticket, TicketId, TicketMessage, UserInfo},
    },
    interaction::{chat_turn::ChatTurnInput, ticket_action::validate_rating},
};

/// Treat zero and negative identifiers as absent.
fn positive(ticket_id: Option<TicketId>) -> Option<TicketId> {
    ticket_id.filter(|id| *id > 0)
}

fn require_ticket_id(ticket_id: Option<TicketId>) -> Result<TicketId, TicketError> {
    positive(ticket_id).ok_or_else(|| TicketError::Validation("Ticket ID is required.".to_string()))
}

// Requests.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiateRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl InitiateRequest {
    pub fn validate(self) -> Result<String, TicketError> {
        self.query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| TicketError::Validation("Query is required.".to_string()))
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatTurn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
}

impl ChatRequest {
    pub fn validate(self) -> Result<ChatTurnInput, TicketError> {
        let messages = self
            .messages
            .filter(|m| !m.is_empty())
            .ok_or_else(|| TicketError::Validation("Messages array is required.".to_string()))?;

        Ok(ChatTurnInput {
            messages,
            user_info: self.user_info,
            ticket_id: positive(self.ticket_id),
        })
    }
}

/// Body of the escalate and urgent endpoints.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub ticket_id: Option<TicketId>,
}

impl TicketRequest {
    pub fn validate(self) -> Result<TicketId, TicketError> {
        require_ticket_id(self.ticket_id)
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub ticket_id: Option<TicketId>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ResolveRequest {
    pub fn validate(self) -> Result<(TicketId, u8, Option<String>), TicketError> {
        let ticket_id = require_ticket_id(self.ticket_id)?;
        let rating = validate_rating(self.rating)?;

        Ok((ticket_id, rating, self.comment))
    }
}

// Responses.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateResponse {
    pub message: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub ai_message: AiMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetailsResponse {
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

// Tests.
