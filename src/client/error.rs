use reqwest::StatusCode;
use serde_json::Value;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A non-success response; `message` is the server's, or a fixed fallback.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// Renewal after a 401 failed; the session has been cleared.
    #[error("Session expired, please sign in again")]
    SessionExpired,
    #[error("failed to persist session: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// Human-readable message, suitable for showing to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Builds a `Status` error from a failed response body.
    ///
    /// The backend reports failures as `{"message": ...}` or `{"error": ...}`.
    pub(crate) fn from_body(status: StatusCode, body: Option<Value>, fallback: &str) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| b.get("message").or_else(|| b.get("error")))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string();
        ApiError::Status { status, message }
    }
}
