//! # Messaging Error Types
//!
//! Structured queue errors using thiserror. Every variant is scoped to a
//! single receive or delete call; the poll loop logs them and moves on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Invalid queue name: {queue_name}: {reason}")]
    InvalidQueueName { queue_name: String, reason: String },

    #[error("Invalid receive request: {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("Invalid receipt handle: {receipt_handle}")]
    InvalidReceiptHandle { receipt_handle: String },

    #[error("Timed out acquiring a database connection: {queue_name}: {operation}")]
    Timeout {
        queue_name: String,
        operation: String,
    },

    #[error("Connection pool closed: {queue_name}")]
    PoolClosed { queue_name: String },
}

impl QueueError {
    pub fn database_connection(message: impl Into<String>) -> Self {
        Self::DatabaseConnection {
            message: message.into(),
        }
    }

    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_queue_name(queue_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQueueName {
            queue_name: queue_name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_request(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            field,
            reason: reason.into(),
        }
    }

    pub fn invalid_receipt_handle(receipt_handle: impl Into<String>) -> Self {
        Self::InvalidReceiptHandle {
            receipt_handle: receipt_handle.into(),
        }
    }

    /// Classify a sqlx failure of `operation` on `queue_name`
    pub fn from_sqlx(queue_name: &str, operation: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::Timeout {
                queue_name: queue_name.to_string(),
                operation: operation.to_string(),
            },
            sqlx::Error::PoolClosed => Self::PoolClosed {
                queue_name: queue_name.to_string(),
            },
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
                Self::database_connection(format!("{operation}: {err}"))
            }
            other => Self::queue_operation(queue_name, operation, other.to_string()),
        }
    }

    /// Short machine-readable kind for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::DatabaseConnection { .. } => "database_connection",
            QueueError::QueueOperation { .. } => "queue_operation",
            QueueError::InvalidQueueName { .. } => "invalid_queue_name",
            QueueError::InvalidRequest { .. } => "invalid_request",
            QueueError::InvalidReceiptHandle { .. } => "invalid_receipt_handle",
            QueueError::Timeout { .. } => "timeout",
            QueueError::PoolClosed { .. } => "pool_closed",
        }
    }
}

pub type MessagingResult<T> = Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueueError::queue_operation("telemetry", "delete", "connection reset");
        let display = format!("{err}");
        assert!(display.contains("Queue operation failed"));
        assert!(display.contains("telemetry"));
        assert!(display.contains("delete"));
        assert!(display.contains("connection reset"));

        let err = QueueError::invalid_request("max_messages", "must be between 1 and 10");
        assert!(err.to_string().contains("max_messages"));
        assert_eq!(err.kind(), "invalid_request");
    }

    #[test]
    fn test_sqlx_classification() {
        let err = QueueError::from_sqlx("telemetry", "receive", sqlx::Error::PoolTimedOut);
        assert!(matches!(
            &err,
            QueueError::Timeout { queue_name, operation }
                if queue_name == "telemetry" && operation == "receive"
        ));
        assert_eq!(err.kind(), "timeout");

        let err = QueueError::from_sqlx("telemetry", "delete", sqlx::Error::PoolClosed);
        assert!(matches!(err, QueueError::PoolClosed { .. }));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = QueueError::from_sqlx("telemetry", "connect", sqlx::Error::Io(io));
        assert!(matches!(err, QueueError::DatabaseConnection { .. }));
        assert!(err.to_string().contains("connect"));

        let err = QueueError::from_sqlx("telemetry", "decode_row", sqlx::Error::RowNotFound);
        assert!(matches!(
            err,
            QueueError::QueueOperation { ref operation, .. } if operation == "decode_row"
        ));
    }
}
