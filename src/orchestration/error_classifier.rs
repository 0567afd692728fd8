//! # Dispatch Error Classification
//!
//! Splits workflow-service failures into those a later redelivery may fix
//! and those that need an operator. The queue-side behavior is identical for
//! both (the message stays in the queue); only the log severity differs.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Throttling, connectivity, timeouts, server-side faults
    Transient,
    /// Bad workflow identifier, rejected input, broken contract
    Permanent,
}

impl ErrorCategory {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Transient)
    }

    /// Category for an HTTP status the workflow service answered with
    pub fn from_status(status: u16) -> Self {
        match status {
            408 | 429 => ErrorCategory::Transient,
            s if s >= 500 => ErrorCategory::Transient,
            _ => ErrorCategory::Permanent,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Permanent => write!(f, "permanent"),
        }
    }
}
