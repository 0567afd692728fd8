//! # Crate Error Types
//!
//! Top-level error for operations that span layers (startup wiring, the
//! binary). Per-message rejections are not errors; see
//! [`crate::orchestration::MessageOutcome`].

use crate::config::ConfigurationError;
use crate::messaging::QueueError;
use crate::orchestration::WorkflowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_layer() {
        let err: BridgeError = ConfigurationError::missing_required("queue.queue_name").into();
        let display = err.to_string();
        assert!(display.starts_with("Configuration error"));
        assert!(display.contains("queue.queue_name"));

        let err: BridgeError = QueueError::invalid_receipt_handle("abc").into();
        assert!(err.to_string().contains("abc"));
    }
}
