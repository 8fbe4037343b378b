//! Orchestrator error types.

use thiserror::Error;

use redact_client::ServiceError;

use crate::tracker::TransitionError;

pub type CoreResult<T> = Result<T, CoreError>;

/// Generic message shown when a failure carries no text of its own.
pub const GENERIC_FAILURE: &str = "Action failed";

#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or malformed parameter, caught before any remote call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Remote classification failed; callers fall back to default suggestions.
    #[error("Classification failed: {0}")]
    Classification(String),

    /// A step of an action recipe failed; remaining steps were not run.
    #[error("{step} failed: {message}")]
    Execution { step: &'static str, message: String },

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    /// A result arrived for a generation that has since been superseded.
    #[error("Stale result for generation {got}, current generation is {current}")]
    Stale { got: u64, current: u64 },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn execution(step: &'static str, err: ServiceError) -> Self {
        Self::Execution {
            step,
            message: err.message(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if the error is swallowed with a silent fallback.
    pub fn is_silent(&self) -> bool {
        matches!(self, CoreError::Classification(_) | CoreError::Stale { .. })
    }

    /// Check if the error was raised before anything reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::UnsupportedAction(_) | CoreError::Transition(_)
        )
    }

    /// Displayable text for the status surface.
    ///
    /// Remote messages are passed through verbatim. Unsupported actions and
    /// empty messages collapse to [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        let message = match self {
            CoreError::Validation(m) | CoreError::Classification(m) | CoreError::Config(m) => m.clone(),
            CoreError::Execution { message, .. } => message.clone(),
            CoreError::UnsupportedAction(_) => String::new(),
            CoreError::Service(e) => e.message(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_message_is_verbatim() {
        let err = CoreError::execution(
            "segment",
            ServiceError::from_http_status(500, "No mask produced for 'cup'"),
        );
        assert_eq!(err.user_message(), "No mask produced for 'cup'");
        assert_eq!(err.to_string(), "segment failed: No mask produced for 'cup'");
    }

    #[test]
    fn test_empty_message_falls_back() {
        let err = CoreError::Execution {
            step: "inpaint",
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert_eq!(CoreError::UnsupportedAction("x".into()).user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_classification() {
        assert!(CoreError::Classification("down".into()).is_silent());
        assert!(CoreError::validation("missing").is_local());
        assert!(!CoreError::validation("missing").is_silent());
    }
}
