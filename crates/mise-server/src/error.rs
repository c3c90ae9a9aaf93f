use crate::host::HostError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mise_agent::AgentError;
use mise_core::error::FailureCategory;
use mise_core::MiseError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// HandlerError
// ---------------------------------------------------------------------------

/// Failure of one command invocation. Never escapes the router.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Core(#[from] MiseError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl HandlerError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, HandlerError::Core(e) if e.is_precondition())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HandlerError::Core(MiseError::Cancelled(_)))
    }

    /// Text shown to the user. Precondition failures are shown as-is;
    /// everything else reads `Failed to <operation>: <message>` with a
    /// pointer when the message hints at a known category.
    pub fn user_summary(&self, operation: &str) -> String {
        let message = self.to_string();
        if self.is_precondition() {
            return message;
        }
        let mut summary = format!("Failed to {operation}: {message}");
        if let Some(category) = FailureCategory::classify(&message) {
            summary.push(' ');
            summary.push_str(category.hint());
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Internal sentinels for explicit HTTP statuses
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ConflictError(String);

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConflictError {}

#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: HTTP responses for the web panel routes
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(ConflictError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<ConflictError>().is_some() {
            StatusCode::CONFLICT
        } else if self.0.downcast_ref::<BadRequestError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if let Some(e) = self.0.downcast_ref::<HostError>() {
            match e {
                HostError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
                HostError::PanelCreation(_) | HostError::Render(_) | HostError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": format!("{:#}", self.0) });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
