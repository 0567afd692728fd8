//! Workflow service errors.

use super::error_classifier::ErrorCategory;
use thiserror::Error;

/// A failed attempt to start a workflow execution.
///
/// "Already exists" is not an error; see [`super::StartOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Workflow service request timed out: {message}")]
    Timeout { message: String },

    #[error("Could not reach workflow service: {message}")]
    Connection { message: String },

    #[error("Workflow service throttled the request: {message}")]
    Throttled { message: String },

    #[error("Workflow service unavailable (HTTP {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Workflow service rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from workflow service: {message}")]
    InvalidResponse { message: String },

    #[error("Workflow client configuration error: {message}")]
    Configuration { message: String },
}

impl WorkflowError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Error for a non-success HTTP status other than 409
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::Throttled { message },
            _ if ErrorCategory::from_status(status).is_retryable() => {
                Self::Unavailable { status, message }
            }
            _ => Self::Rejected { status, message },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::Timeout { .. }
            | WorkflowError::Connection { .. }
            | WorkflowError::Throttled { .. }
            | WorkflowError::Unavailable { .. } => ErrorCategory::Transient,
            WorkflowError::Rejected { .. }
            | WorkflowError::InvalidResponse { .. }
            | WorkflowError::Configuration { .. } => ErrorCategory::Permanent,
        }
    }
}

impl From<reqwest::Error> for WorkflowError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout { message }
        } else if err.is_decode() {
            Self::InvalidResponse { message }
        } else if err.is_builder() {
            Self::Configuration { message }
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), message)
        } else {
            Self::Connection { message }
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
