//! # Queue Message Types
//!
//! Messages as delivered by a [`QueueClient`](super::QueueClient), plus the
//! validated receive request.

use super::errors::{MessagingResult, QueueError};
use crate::constants::queue::{MAX_BATCH_SIZE, MAX_WAIT_TIME_SECONDS, MIN_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue-assigned message identifier, stable across redeliveries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability token for deleting one particular delivery of a message.
///
/// A new handle is issued on every redelivery; older handles stop working.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Handles are capabilities; keep them out of Debug output
impl fmt::Debug for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReceiptHandle(..)")
    }
}

/// A single delivery of a telemetry message
#[derive(Debug, Clone)]
pub struct TelemetryMessage {
    pub id: MessageId,
    pub receipt_handle: ReceiptHandle,
    pub body: Vec<u8>,
    /// How many times the queue has delivered this message, including this one
    pub receive_count: u32,
}

impl TelemetryMessage {
    pub fn new(
        id: MessageId,
        receipt_handle: ReceiptHandle,
        body: impl Into<Vec<u8>>,
        receive_count: u32,
    ) -> Self {
        Self {
            id,
            receipt_handle,
            body: body.into(),
            receive_count,
        }
    }
}

/// Parameters of a receive call, range-checked at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveRequest {
    max_messages: u32,
    wait_time_seconds: u32,
    visibility_timeout_seconds: u32,
}

impl ReceiveRequest {
    pub fn new(
        max_messages: u32,
        wait_time_seconds: u32,
        visibility_timeout_seconds: u32,
    ) -> MessagingResult<Self> {
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&max_messages) {
            return Err(QueueError::invalid_request(
                "max_messages",
                format!("{max_messages} is outside {MIN_BATCH_SIZE}..={MAX_BATCH_SIZE}"),
            ));
        }
        if wait_time_seconds > MAX_WAIT_TIME_SECONDS {
            return Err(QueueError::invalid_request(
                "wait_time_seconds",
                format!("{wait_time_seconds} exceeds {MAX_WAIT_TIME_SECONDS}"),
            ));
        }
        if visibility_timeout_seconds == 0 {
            return Err(QueueError::invalid_request(
                "visibility_timeout_seconds",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            max_messages,
            wait_time_seconds,
            visibility_timeout_seconds,
        })
    }

    pub fn max_messages(&self) -> u32 {
        self.max_messages
    }

    pub fn wait_time_seconds(&self) -> u32 {
        self.wait_time_seconds
    }

    pub fn visibility_timeout_seconds(&self) -> u32 {
        self.visibility_timeout_seconds
    }
}
