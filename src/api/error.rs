//! Conversion of failures into HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::models::ErrorResponse;
use crate::base::error::TicketError;

/// An error returned by an API handler as `{error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Map a downstream failure.
    ///
    /// Caller-side ticket errors keep their message and get a 4xx status.
    /// Anything else is logged and hidden behind the endpoint's generic message.
    pub fn from_failure(err: anyhow::Error, generic_message: &str) -> Self {
        match err.downcast_ref::<TicketError>() {
            Some(ticket_err) if ticket_err.is_client_error() => {
                warn!("Request rejected: {ticket_err}");
                Self::from(ticket_err.clone())
            }
            _ => {
                error!("{generic_message} {err:#}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, generic_message)
            }
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        let status = match &err {
            TicketError::Validation(_) => StatusCode::BAD_REQUEST,
            TicketError::NotFound(_) => StatusCode::NOT_FOUND,
            TicketError::InvalidTransition { .. } | TicketError::TicketClosed(_) => StatusCode::CONFLICT,
            TicketError::Upstream(_) | TicketError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("Invalid ticket ID: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

// Tests.
