pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    error::TicketError,
    types::{Category, ChatTurn, Res, Role, TriageReply},
};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// Classification is part of the structured reply, so the orchestration layer
/// never scrapes free text. Implementing this trait allows different LLM
/// providers to be used with the support desk.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Turn a linear chat history into one assistant reply.
    ///
    /// The history must already start with a user turn (see [`triage_history`]);
    /// its last entry is the new user turn.
    async fn triage(&self, history: &[ChatTurn]) -> Res<TriageReply>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}

// Helpers.

/// Prepare a client-supplied history for the triage agent.
///
/// A leading assistant turn (the greeting) is dropped, since the conversation
/// must open with the user. Fails when no non-blank final turn remains.
pub fn triage_history(messages: &[ChatTurn]) -> Result<&[ChatTurn], TicketError> {
    let history = match messages.first() {
        Some(first) if first.role == Role::Assistant => &messages[1..],
        _ => messages,
    };

    match history.last() {
        Some(last) if !last.content.trim().is_empty() => Ok(history),
        _ => Err(TicketError::Validation("No user message found.".to_string())),
    }
}

/// Find the first `[...]` label in a reply and map it onto the fixed label set.
///
/// A label never spans a line break; an unclosed `[` on one line is skipped.
pub fn extract_category(reply: &str) -> Option<Category> {
    let label = reply.match_indices('[').find_map(|(start, _)| {
        let rest = &reply[start + 1..];
        let end = rest.find(|c: char| c == ']' || c == '\n')?;

        rest[end..].starts_with(']').then(|| &rest[..end])
    })?;

    label.parse::<Category>().ok().filter(|category| Category::LABELS.contains(category))
}

// Tests.
