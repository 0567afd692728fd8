//! # In-Memory Queue
//!
//! Process-local [`QueueClient`] with the delivery semantics of a hosted
//! queue: received messages are hidden until their visibility deadline,
//! redelivered afterwards with a fresh receipt handle, and removed only by a
//! delete carrying the handle of the latest delivery.
//!
//! Used by the integration tests and for running the bridge without a
//! database.

use super::errors::{MessagingResult, QueueError};
use super::message::{MessageId, ReceiptHandle, ReceiveRequest, TelemetryMessage};
use super::queue_client::QueueClient;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug)]
struct StoredMessage {
    id: MessageId,
    body: Vec<u8>,
    visible_at: Instant,
    receive_count: u32,
    current_handle: Option<String>,
}

#[derive(Debug)]
pub struct InMemoryQueue {
    name: String,
    messages: Mutex<Vec<StoredMessage>>,
    available: Notify,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(Vec::new()),
            available: Notify::new(),
        }
    }

    /// Enqueue a body and return its message id
    pub fn send(&self, body: impl Into<Vec<u8>>) -> MessageId {
        let id = MessageId::new(Uuid::new_v4().to_string());
        self.messages.lock().push(StoredMessage {
            id: id.clone(),
            body: body.into(),
            visible_at: Instant::now(),
            receive_count: 0,
            current_handle: None,
        });
        self.available.notify_waiters();
        id
    }

    /// Messages not yet deleted, visible or not
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages currently hidden by a visibility timeout
    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        self.messages
            .lock()
            .iter()
            .filter(|m| m.visible_at > now)
            .count()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.lock().iter().any(|m| &m.id == id)
    }

    /// Times `id` has been delivered so far
    pub fn receive_count(&self, id: &MessageId) -> Option<u32> {
        self.messages
            .lock()
            .iter()
            .find(|m| &m.id == id)
            .map(|m| m.receive_count)
    }

    /// End every visibility timeout now, as if the deadline had passed
    pub fn expire_visibility(&self) {
        let now = Instant::now();
        for message in self.messages.lock().iter_mut() {
            message.visible_at = now;
        }
        self.available.notify_waiters();
    }

    fn take_visible(&self, request: &ReceiveRequest) -> (Vec<TelemetryMessage>, Option<Instant>) {
        let now = Instant::now();
        let visibility = Duration::from_secs(u64::from(request.visibility_timeout_seconds()));
        let limit = request.max_messages() as usize;

        let mut messages = self.messages.lock();
        let mut delivered = Vec::new();
        for stored in messages.iter_mut() {
            if delivered.len() == limit {
                break;
            }
            if stored.visible_at > now {
                continue;
            }

            stored.receive_count += 1;
            stored.visible_at = now + visibility;
            let handle = format!("{}#{}", stored.id, stored.receive_count);
            stored.current_handle = Some(handle.clone());

            delivered.push(TelemetryMessage::new(
                stored.id.clone(),
                ReceiptHandle::new(handle),
                stored.body.clone(),
                stored.receive_count,
            ));
        }

        let next_visible = messages.iter().map(|m| m.visible_at).min();
        (delivered, next_visible)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn receive(&self, request: &ReceiveRequest) -> MessagingResult<Vec<TelemetryMessage>> {
        let deadline =
            Instant::now() + Duration::from_secs(u64::from(request.wait_time_seconds()));

        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let (delivered, next_visible) = self.take_visible(request);
            if !delivered.is_empty() {
                return Ok(delivered);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }

            let wake_at = next_visible
                .filter(|at| *at > now)
                .map_or(deadline, |at| at.min(deadline));
            let _ = tokio::time::timeout_at(wake_at, notified).await;
        }
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> MessagingResult<()> {
        let mut messages = self.messages.lock();
        let position = messages
            .iter()
            .position(|m| m.current_handle.as_deref() == Some(receipt_handle.as_str()))
            .ok_or_else(|| QueueError::invalid_receipt_handle(receipt_handle.as_str()))?;
        messages.remove(position);
        Ok(())
    }

    fn queue_name(&self) -> &str {
        &self.name
    }
}
