// relay-server/src/error.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::models::relay::RelayResult;
use serde_json::Value;
use thiserror::Error;

use crate::upstream::UpstreamError;

pub const CONNECT_MESSAGE: &str =
    "Cannot connect to n8n server. Please ensure n8n is running and reachable.";
pub const TIMEOUT_MESSAGE: &str = "Request to n8n timed out, please try again.";
pub const NO_SESSION_MESSAGE: &str = "No authentication cookie found";
pub const SESSION_INVALID_MESSAGE: &str = "Session validation failed";

/// Request-level failure, rendered as `{ success: false, error, details? }`
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", CONNECT_MESSAGE)]
    Unreachable { details: String },

    #[error("{message}")]
    Unauthorized { message: String, details: Option<Value> },

    #[error("{message}")]
    Conflict { message: String, details: Option<Value> },

    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    #[error("{message}")]
    Upstream { status: u16, message: String, details: Option<Value> },

    #[error("{}", NO_SESSION_MESSAGE)]
    SessionMissing,

    #[error("{}", SESSION_INVALID_MESSAGE)]
    SessionInvalid,

    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    Internal(String),
}

/// Messages used when the upstream answers 401 / 409
pub struct FailureMessages {
    pub generic: &'static str,
    pub unauthorized: &'static str,
    pub conflict: Option<&'static str>,
}

pub const LOGIN_MESSAGES: FailureMessages = FailureMessages {
    generic: "Authentication failed",
    unauthorized: "Invalid credentials provided.",
    conflict: None,
};

pub const SIGNUP_MESSAGES: FailureMessages = FailureMessages {
    generic: "User creation failed",
    unauthorized: "Invalid API key",
    conflict: Some("User already exists"),
};

pub const INVITATION_MESSAGES: FailureMessages = FailureMessages {
    generic: "Invitation acceptance failed",
    unauthorized: "Invitation could not be authorized.",
    conflict: None,
};

impl RelayError {
    /// Map an upstream failure using the relay's wording
    pub fn from_upstream(err: UpstreamError, messages: &FailureMessages) -> Self {
        let upstream_message = err.upstream_message().map(str::to_string);
        match err {
            UpstreamError::Connect(e) => RelayError::Unreachable { details: e.to_string() },
            UpstreamError::Timeout(_) => RelayError::Timeout,
            UpstreamError::Transport(e) => RelayError::Internal(format!("{}: {}", messages.generic, e)),
            UpstreamError::Status { status: 401, body } => RelayError::Unauthorized {
                message: messages.unauthorized.to_string(),
                details: non_null(body),
            },
            UpstreamError::Status { status: 409, body } if messages.conflict.is_some() => RelayError::Conflict {
                message: messages.conflict.unwrap_or(messages.generic).to_string(),
                details: non_null(body),
            },
            UpstreamError::Status { status, body } => {
                let message = upstream_message.unwrap_or_else(|| format!("n8n server error: {}", status));
                RelayError::Upstream {
                    status,
                    message,
                    details: non_null(body),
                }
            }
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            RelayError::Unreachable { details } => Some(Value::String(details.clone())),
            RelayError::Unauthorized { details, .. }
            | RelayError::Conflict { details, .. }
            | RelayError::Upstream { details, .. } => details.clone(),
            _ => None,
        }
    }
}

fn non_null(body: Value) -> Option<Value> {
    if body.is_null() {
        None
    } else {
        Some(body)
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Unreachable { .. } | RelayError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Unauthorized { .. } | RelayError::SessionMissing | RelayError::SessionInvalid => {
                StatusCode::UNAUTHORIZED
            }
            RelayError::Conflict { .. } => StatusCode::CONFLICT,
            RelayError::Timeout | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Anything upstream sends that is not a valid error status becomes a 502
            RelayError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = RelayResult::failure(self.to_string());
        if let Some(details) = self.details() {
            body = body.with_details(details);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
