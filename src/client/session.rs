//! Chat session state machine.
//!
//! `NoUserInfo -> CollectingTurns -> Resolved { reviewed }`, with `reset`
//! returning to the start for a new ticket.

use crate::{
    api::models::{AiMessage, ChatRequest, ResolveRequest, TicketRequest},
    base::{
        error::TicketError,
        types::{ChatTurn, Role, TicketId, UserInfo},
    },
};

/// Text shown while the assistant's reply is pending.
pub const TYPING_INDICATOR: &str = "...";

/// Case-insensitive cue in an assistant reply that offers resolution.
const RESOLUTION_CUE: &str = "resolved?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Contact details not yet collected.
    #[default]
    NoUserInfo,
    /// Free-text conversation with the assistant.
    CollectingTurns,
    /// The assistant offered resolution; no more free text.
    Resolved { reviewed: bool },
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    state: SessionState,
    user_info: Option<UserInfo>,
    ticket_id: Option<TicketId>,
    transcript: Vec<ChatTurn>,
    awaiting_reply: bool,
    notice: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ticket_id(&self) -> Option<TicketId> {
        self.ticket_id
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Inline error from the last failed turn, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// The transcript as displayed, with the typing indicator while a reply is pending.
    pub fn view(&self) -> Vec<ChatTurn> {
        let mut view = self.transcript.clone();

        if self.awaiting_reply {
            view.push(ChatTurn::assistant(TYPING_INDICATOR));
        }

        view
    }

    /// Whether escalate/urgent are offered.
    pub fn can_act_on_ticket(&self) -> bool {
        self.ticket_id.is_some() && self.state == SessionState::CollectingTurns
    }

    /// Store the user's details and greet them.
    pub fn start(&mut self, user: UserInfo) -> Result<(), TicketError> {
        if self.state != SessionState::NoUserInfo {
            return Err(TicketError::Validation("A chat is already in progress.".to_string()));
        }

        user.validate()?;

        self.transcript = vec![ChatTurn::assistant(format!("Hello {}! How can I help you today?", user.name))];
        self.user_info = Some(user);
        self.state = SessionState::CollectingTurns;

        Ok(())
    }

    /// Append the user's turn optimistically and build the request for it.
    pub fn submit(&mut self, text: &str) -> Result<ChatRequest, TicketError> {
        if self.state != SessionState::CollectingTurns {
            return Err(TicketError::Validation("The chat is not accepting messages.".to_string()));
        }

        if self.awaiting_reply {
            return Err(TicketError::Validation("Still waiting for the previous reply.".to_string()));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(TicketError::Validation("Message is empty.".to_string()));
        }

        self.transcript.push(ChatTurn::user(text));
        self.awaiting_reply = true;
        self.notice = None;

        Ok(ChatRequest {
            messages: Some(self.transcript.clone()),
            user_info: if self.ticket_id.is_none() { self.user_info.clone() } else { None },
            ticket_id: self.ticket_id,
        })
    }

    /// Replace the typing indicator with the assistant's reply.
    pub fn receive(&mut self, reply: AiMessage) {
        self.awaiting_reply = false;

        if let Some(ticket_id) = reply.ticket_id {
            self.ticket_id = Some(ticket_id);
        }

        if reply.content.to_lowercase().contains(RESOLUTION_CUE) {
            self.state = SessionState::Resolved { reviewed: false };
        }

        self.transcript.push(ChatTurn {
            role: Role::Assistant,
            content: reply.content,
        });
    }

    /// Record a failed turn.
    ///
    /// The optimistic user turn is withdrawn and returned so it can be resubmitted.
    pub fn fail(&mut self, error: impl Into<String>) -> Option<String> {
        self.awaiting_reply = false;
        self.notice = Some(format!("Error: {}", error.into()));

        match self.transcript.last() {
            Some(turn) if turn.role == Role::User => self.transcript.pop().map(|turn| turn.content),
            _ => None,
        }
    }

    pub fn escalate_request(&self) -> Result<TicketRequest, TicketError> {
        self.ticket_request()
    }

    pub fn urgent_request(&self) -> Result<TicketRequest, TicketError> {
        self.ticket_request()
    }

    fn ticket_request(&self) -> Result<TicketRequest, TicketError> {
        if !self.can_act_on_ticket() {
            return Err(TicketError::Validation("No open ticket to act on yet.".to_string()));
        }

        Ok(TicketRequest { ticket_id: self.ticket_id })
    }

    /// Build the review for a resolved ticket; only offered once.
    pub fn review_request(&self, rating: u8, comment: &str) -> Result<ResolveRequest, TicketError> {
        if self.state != (SessionState::Resolved { reviewed: false }) || self.ticket_id.is_none() {
            return Err(TicketError::Validation("There is no ticket awaiting review.".to_string()));
        }

        if !(1..=5).contains(&rating) {
            return Err(TicketError::Validation("Rating must be between 1 and 5.".to_string()));
        }

        let comment = comment.trim();

        Ok(ResolveRequest {
            ticket_id: self.ticket_id,
            rating: Some(i64::from(rating)),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
        })
    }

    pub fn mark_reviewed(&mut self) {
        if let SessionState::Resolved { reviewed } = &mut self.state {
            *reviewed = true;
        }
    }

    /// Start over for another ticket.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// Tests.
