//! Chat turns: open a ticket on the first turn, extend its transcript afterwards.

use tracing::{info, instrument};

use super::{notification, notify};
use crate::{
    base::{
        error::TicketError,
        types::{Category, ChatTurn, Res, Role, TicketId, TicketStatus, UserInfo},
    },
    runtime::Runtime,
    service::llm::triage_history,
};

/// A validated chat turn request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnInput {
    /// Full client-side history, the new user turn last.
    pub messages: Vec<ChatTurn>,
    /// Required when no ticket exists yet.
    pub user_info: Option<UserInfo>,
    /// Absent on the first turn of a session.
    pub ticket_id: Option<TicketId>,
}

/// The assistant's reply to a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnOutcome {
    pub reply: String,
    /// Set only when this turn created the ticket.
    pub ticket_id: Option<TicketId>,
}

/// Handle one chat turn.
///
/// Everything is validated before the first side effect. Writes that happened
/// before a later failure (AI, store, or mail) are kept.
#[instrument(skip_all, fields(ticket_id = ?input.ticket_id))]
pub async fn handle_chat_turn(input: ChatTurnInput, runtime: &Runtime) -> Res<ChatTurnOutcome> {
    let history = triage_history(&input.messages)?;

    match input.ticket_id {
        None => {
            let user = input.user_info.ok_or_else(|| TicketError::Validation("User info is required to open a ticket.".to_string()))?;
            user.validate()?;

            open_ticket(history, &user, runtime).await
        }
        Some(ticket_id) => continue_ticket(ticket_id, history, runtime).await,
    }
}

/// First turn: classify, create the ticket, store the opening exchange, notify the team.
async fn open_ticket(history: &[ChatTurn], user: &UserInfo, runtime: &Runtime) -> Res<ChatTurnOutcome> {
    let Some(user_turn) = history.last() else {
        return Err(TicketError::Validation("No user message found.".to_string()).into());
    };

    let triage = runtime.llm.triage(history).await.map_err(TicketError::upstream)?;
    let category = triage.category.unwrap_or(Category::Unclassified);

    let ticket_id = runtime.db.create_ticket(category, user).await?;
    runtime.db.append_message(ticket_id, Role::User, &user_turn.content).await?;
    runtime.db.append_message(ticket_id, Role::Assistant, &triage.reply).await?;

    info!("Opened ticket #{ticket_id} as `{category}`.");

    let to = runtime.config.routing.recipient_for(category);
    notify(&runtime.mail, &notification::new_ticket(to, ticket_id, category, &user_turn.content, &runtime.config.ticket_link_base_url)).await?;

    Ok(ChatTurnOutcome {
        reply: triage.reply,
        ticket_id: Some(ticket_id),
    })
}

/// Later turns: reply with the full history and append the new exchange.
async fn continue_ticket(ticket_id: TicketId, history: &[ChatTurn], runtime: &Runtime) -> Res<ChatTurnOutcome> {
    let Some(user_turn) = history.last() else {
        return Err(TicketError::Validation("No user message found.".to_string()).into());
    };

    let ticket = runtime.db.get_ticket(ticket_id).await?;

    if ticket.status == TicketStatus::Resolved && !runtime.config.accept_messages_after_resolution {
        return Err(TicketError::TicketClosed(ticket_id).into());
    }

    let triage = runtime.llm.triage(history).await.map_err(TicketError::upstream)?;

    runtime.db.append_message(ticket_id, Role::User, &user_turn.content).await?;
    runtime.db.append_message(ticket_id, Role::Assistant, &triage.reply).await?;

    info!("Appended turn to ticket #{ticket_id}.");

    Ok(ChatTurnOutcome {
        reply: triage.reply,
        ticket_id: None,
    })
}
