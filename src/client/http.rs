//! HTTP client for the support desk API.

use reqwest::StatusCode;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    api::models::{AiMessage, ChatRequest, ChatResponse, ErrorResponse, MessageResponse, ResolveRequest, TicketDetailsResponse, TicketRequest},
    base::types::{Res, TicketId},
};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Res<AiMessage> {
        let response: ChatResponse = self.post("/api/chat", request).await?;
        Ok(response.ai_message)
    }

    pub async fn escalate(&self, request: &TicketRequest) -> Res<MessageResponse> {
        self.post("/api/ticket/escalate", request).await
    }

    pub async fn mark_urgent(&self, request: &TicketRequest) -> Res<MessageResponse> {
        self.post("/api/ticket/urgent", request).await
    }

    pub async fn resolve(&self, request: &ResolveRequest) -> Res<MessageResponse> {
        self.post("/api/ticket/resolve", request).await
    }

    pub async fn ticket(&self, ticket_id: TicketId) -> Res<TicketDetailsResponse> {
        let response = self.http.get(format!("{}/api/ticket/{ticket_id}", self.base_url)).send().await?;
        Self::read(response).await
    }

    #[instrument(skip(self, body))]
    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Res<R> {
        let response = self.http.post(format!("{}{path}", self.base_url)).json(body).send().await?;
        Self::read(response).await
    }

    /// Decode a success body, or surface the server's `{error}` message.
    async fn read<R: DeserializeOwned>(response: reqwest::Response) -> Res<R> {
        let status = response.status();
        debug!("Server responded with {status}.");

        if status.is_success() {
            return Ok(response.json::<R>().await?);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("Request failed.").to_string(),
        };

        Err(RequestFailed { status, message }.into())
    }
}

/// A non-success response from the server.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RequestFailed {
    pub status: StatusCode,
    pub message: String,
}
