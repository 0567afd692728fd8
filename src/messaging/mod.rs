//! # Messaging Module
//!
//! Queue access for telemetry ingestion: the [`QueueClient`] trait, a pgmq
//! implementation for production, and an in-memory queue with the same
//! visibility-timeout semantics.

pub mod errors;
pub mod in_memory;
pub mod message;
pub mod pgmq_client;
pub mod queue_client;

pub use errors::{MessagingResult, QueueError};
pub use in_memory::InMemoryQueue;
pub use message::{MessageId, ReceiptHandle, ReceiveRequest, TelemetryMessage};
pub use pgmq_client::PgmqQueueClient;
pub use queue_client::QueueClient;
