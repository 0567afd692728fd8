//! Queue acknowledgment: deleting a message once it no longer needs redelivery.
//!
//! A failed delete is logged and reported, never retried or rolled back. The
//! worst case is a redelivery whose dispatch collapses onto the execution
//! that already exists.

use crate::messaging::{QueueClient, QueueError, TelemetryMessage};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub enum AckOutcome {
    Deleted,
    DeleteFailed { error: QueueError },
    /// Left in the queue for redelivery
    Retained,
}

impl AckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckOutcome::Deleted => "deleted",
            AckOutcome::DeleteFailed { .. } => "delete_failed",
            AckOutcome::Retained => "retained",
        }
    }
}

pub struct Acknowledger {
    queue: Arc<dyn QueueClient>,
}

impl Acknowledger {
    pub fn new(queue: Arc<dyn QueueClient>) -> Self {
        Self { queue }
    }

    pub async fn acknowledge(&self, message: &TelemetryMessage) -> AckOutcome {
        match self.queue.delete(&message.receipt_handle).await {
            Ok(()) => AckOutcome::Deleted,
            Err(error) => {
                warn!(
                    message_id = %message.id,
                    queue = %self.queue.queue_name(),
                    error_kind = error.kind(),
                    error = %error,
                    "Failed to delete message; it will be redelivered"
                );
                AckOutcome::DeleteFailed { error }
            }
        }
    }
}
