//! Queue client abstraction.

use super::errors::MessagingResult;
use super::message::{ReceiptHandle, ReceiveRequest, TelemetryMessage};
use async_trait::async_trait;

/// Receive and delete operations against a message queue.
///
/// Implementations never retry; the poll loop decides what a failure means.
#[async_trait]
pub trait QueueClient: Send + Sync + 'static {
    /// Long-poll for up to `request.max_messages()` messages.
    ///
    /// Blocks at most `request.wait_time_seconds()` when the queue is empty and
    /// returns as soon as at least one message is available. Returned messages
    /// stay hidden from other receivers for the visibility timeout.
    async fn receive(&self, request: &ReceiveRequest) -> MessagingResult<Vec<TelemetryMessage>>;

    /// Permanently remove the delivery identified by `receipt_handle`
    async fn delete(&self, receipt_handle: &ReceiptHandle) -> MessagingResult<()>;

    /// Name of the queue, for logging
    fn queue_name(&self) -> &str;
}
