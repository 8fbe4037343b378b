//! Remote service error types.

use thiserror::Error;

/// Result type for remote service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors that can occur while talking to the remediation services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Remote service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn remote(status: u16, msg: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: msg.into(),
        }
    }

    /// Map an HTTP status and the extracted remote message onto an error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => Self::BadRequest(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            _ => Self::Remote { status, message },
        }
    }

    /// HTTP status associated with the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::Remote { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The human-readable text, without the variant prefix.
    ///
    /// This is what reaches the user when an action fails.
    pub fn message(&self) -> String {
        match self {
            Self::Config(m)
            | Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::RateLimited(m)
            | Self::InvalidResponse(m) => m.clone(),
            Self::Remote { message, .. } => message.clone(),
            Self::Network(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}

/// Pull a readable message out of an error response body.
///
/// Recognises `{"detail": ..}`, `{"error": ..}` and `{"message": ..}`;
/// otherwise returns the trimmed body, or `fallback` if the body is empty.
pub fn extract_error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return s.trim().to_string()
                }
                Some(serde_json::Value::Object(inner)) => {
                    if let Some(serde_json::Value::String(s)) = inner.get("message") {
                        return s.trim().to_string();
                    }
                }
                _ => {}
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
