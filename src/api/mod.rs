//! HTTP API of the support desk.
//!
//! Every endpoint takes and returns JSON. Validation runs before any side
//! effect; downstream failures are mapped by [`ApiError::from_failure`].

pub mod error;
pub mod models;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{instrument, warn};

use crate::{
    base::types::{Role, TicketId},
    interaction::{
        chat_turn::handle_chat_turn,
        ticket_action::{escalate_ticket, mark_urgent, resolve_ticket, ticket_details},
    },
    runtime::Runtime,
};

pub use error::ApiError;
use models::{
    AiMessage, ChatRequest, ChatResponse, HealthResponse, InitiateRequest, InitiateResponse, MessageResponse, ResolveRequest, TicketDetailsResponse, TicketRequest,
};

/// Build the router over a runtime.
pub fn router(runtime: Runtime) -> Router {
    let origin = match runtime.config.cors_allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            warn!("Invalid CORS origin `{}`; allowing any origin.", runtime.config.cors_allowed_origin);
            AllowOrigin::any()
        }
    };

    let cors = CorsLayer::new().allow_origin(origin).allow_methods([Method::GET, Method::POST]).allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/ticket/initiate", post(initiate))
        .route("/api/chat", post(chat))
        .route("/api/ticket/escalate", post(escalate))
        .route("/api/ticket/urgent", post(urgent))
        .route("/api/ticket/resolve", post(resolve))
        .route("/api/ticket/{ticket_id}", get(ticket))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(runtime)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

/// Acknowledge an initial query; nothing is persisted.
#[instrument(skip_all)]
async fn initiate(payload: Result<Json<InitiateRequest>, JsonRejection>) -> Result<Json<InitiateResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.validate()?;

    Ok(Json(InitiateResponse {
        message: "Received your query!".to_string(),
        query,
    }))
}

#[instrument(skip_all)]
async fn chat(State(runtime): State<Runtime>, payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let outcome = handle_chat_turn(input, &runtime).await.map_err(|err| ApiError::from_failure(err, "AI service error."))?;

    Ok(Json(ChatResponse {
        ai_message: AiMessage {
            role: Role::Assistant,
            content: outcome.reply,
            ticket_id: outcome.ticket_id,
        },
    }))
}

#[instrument(skip_all)]
async fn escalate(State(runtime): State<Runtime>, payload: Result<Json<TicketRequest>, JsonRejection>) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let ticket_id = request.validate()?;

    escalate_ticket(ticket_id, &runtime).await.map_err(|err| ApiError::from_failure(err, "Failed to escalate ticket."))?;

    Ok(Json(MessageResponse::new("Ticket escalated successfully.")))
}

#[instrument(skip_all)]
async fn urgent(State(runtime): State<Runtime>, payload: Result<Json<TicketRequest>, JsonRejection>) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let ticket_id = request.validate()?;

    mark_urgent(ticket_id, &runtime).await.map_err(|err| ApiError::from_failure(err, "Failed to mark ticket as urgent."))?;

    Ok(Json(MessageResponse::new("Ticket marked as urgent.")))
}

#[instrument(skip_all)]
async fn resolve(State(runtime): State<Runtime>, payload: Result<Json<ResolveRequest>, JsonRejection>) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let (ticket_id, rating, comment) = request.validate()?;

    resolve_ticket(ticket_id, rating, comment, &runtime).await.map_err(|err| ApiError::from_failure(err, "Failed to resolve ticket."))?;

    Ok(Json(MessageResponse::new("Ticket resolved and review submitted.")))
}

#[instrument(skip_all)]
async fn ticket(State(runtime): State<Runtime>, path: Result<Path<TicketId>, PathRejection>) -> Result<Json<TicketDetailsResponse>, ApiError> {
    let Path(ticket_id) = path?;

    let (ticket, messages) = ticket_details(ticket_id, &runtime).await.map_err(|err| ApiError::from_failure(err, "Failed to load ticket."))?;

    Ok(Json(TicketDetailsResponse { ticket, messages }))
}
