//! # Poll Loop
//!
//! Receives batches from the queue and hands each message to the
//! [`MessageProcessor`].
//!
//! [`PollLoop::run_once`] is a single receive plus batch, for timer-driven
//! callers. [`PollLoop::run`] repeats it until shutdown, continuing
//! immediately after a non-empty batch and backing off after an empty batch
//! or a failed receive.
//!
//! Shutdown is checked between messages. A message that has started
//! processing always finishes, including its delete, before the loop returns.
//! In concurrent mode no new message is started once shutdown is requested.

use super::processor::{MessageOutcome, MessageProcessor};
use crate::config::ProcessingMode;
use crate::messaging::{QueueClient, ReceiveRequest, TelemetryMessage};
use crate::orchestration::acknowledger::AckOutcome;
use crate::orchestration::dispatcher::DispatchOutcome;
use crate::orchestration::error_classifier::ErrorCategory;
use crate::shutdown::ShutdownSignal;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Counts per outcome for one batch, or accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub received: usize,
    /// Executions confirmed, fresh or pre-existing
    pub dispatched: usize,
    pub already_existed: usize,
    pub rejected: usize,
    /// Rejections deleted under the `discard` policy
    pub discarded: usize,
    pub transient_failures: usize,
    pub permanent_failures: usize,
    pub deleted: usize,
    pub delete_failures: usize,
    /// Received but not started because shutdown was requested
    pub skipped: usize,
    pub receive_failures: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &MessageOutcome) {
        match outcome {
            MessageOutcome::Dispatched { dispatch, .. } => {
                self.dispatched += 1;
                if matches!(dispatch, DispatchOutcome::AlreadyExists { .. }) {
                    self.already_existed += 1;
                }
            }
            MessageOutcome::Rejected { ack, .. } => {
                self.rejected += 1;
                if matches!(ack, AckOutcome::Deleted) {
                    self.discarded += 1;
                }
            }
            MessageOutcome::DispatchFailed(failure) => match failure.category() {
                ErrorCategory::Transient => self.transient_failures += 1,
                ErrorCategory::Permanent => self.permanent_failures += 1,
            },
        }

        match outcome.ack() {
            Some(AckOutcome::Deleted) => self.deleted += 1,
            Some(AckOutcome::DeleteFailed { .. }) => self.delete_failures += 1,
            Some(AckOutcome::Retained) | None => {}
        }
    }

    pub fn merge(&mut self, other: &BatchSummary) {
        self.received += other.received;
        self.dispatched += other.dispatched;
        self.already_existed += other.already_existed;
        self.rejected += other.rejected;
        self.discarded += other.discarded;
        self.transient_failures += other.transient_failures;
        self.permanent_failures += other.permanent_failures;
        self.deleted += other.deleted;
        self.delete_failures += other.delete_failures;
        self.skipped += other.skipped;
        self.receive_failures += other.receive_failures;
    }

    /// Nothing was received, so the caller should back off
    pub fn is_idle(&self) -> bool {
        self.received == 0
    }
}

pub struct PollLoop {
    queue: Arc<dyn QueueClient>,
    processor: Arc<MessageProcessor>,
    request: ReceiveRequest,
    mode: ProcessingMode,
    max_in_flight: usize,
    idle_backoff: Duration,
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("queue", &self.queue.queue_name())
            .field("request", &self.request)
            .field("mode", &self.mode)
            .field("max_in_flight", &self.max_in_flight)
            .field("idle_backoff", &self.idle_backoff)
            .finish()
    }
}

impl PollLoop {
    pub fn new(
        queue: Arc<dyn QueueClient>,
        processor: MessageProcessor,
        request: ReceiveRequest,
    ) -> Self {
        Self {
            queue,
            processor: Arc::new(processor),
            request,
            mode: ProcessingMode::Sequential,
            max_in_flight: 1,
            idle_backoff: Duration::from_secs(1),
        }
    }

    /// `max_in_flight` only applies to [`ProcessingMode::Concurrent`]
    pub fn with_mode(mut self, mode: ProcessingMode, max_in_flight: usize) -> Self {
        self.mode = mode;
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    /// Receive one batch and process it.
    ///
    /// A shutdown requested during the long-poll abandons the receive; any
    /// messages it would have returned stay hidden until their visibility
    /// timeout passes and are then redelivered.
    #[instrument(skip(self, shutdown), fields(queue = %self.queue.queue_name()))]
    pub async fn run_once(&self, shutdown: &ShutdownSignal) -> BatchSummary {
        let mut summary = BatchSummary::default();
        if shutdown.is_triggered() {
            return summary;
        }

        let received = tokio::select! {
            biased;
            () = shutdown.wait() => return summary,
            result = self.queue.receive(&self.request) => result,
        };

        let messages = match received {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error_kind = e.kind(), error = %e, "Failed to receive messages");
                summary.receive_failures = 1;
                return summary;
            }
        };

        if messages.is_empty() {
            return summary;
        }
        summary.received = messages.len();
        debug!(message_count = messages.len(), mode = ?self.mode, "Processing batch");

        let outcomes = match self.mode {
            ProcessingMode::Sequential => self.process_sequential(&messages, shutdown).await,
            ProcessingMode::Concurrent => self.process_concurrent(&messages, shutdown).await,
        };

        for outcome in &outcomes {
            summary.record(outcome);
        }
        summary.skipped = summary.received - outcomes.len();
        if summary.skipped > 0 {
            info!(skipped = summary.skipped, "Shutdown requested mid-batch; remaining messages left for redelivery");
        }

        summary
    }

    async fn process_sequential(
        &self,
        messages: &[TelemetryMessage],
        shutdown: &ShutdownSignal,
    ) -> Vec<MessageOutcome> {
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            if shutdown.is_triggered() {
                break;
            }
            outcomes.push(self.processor.process(message).await);
        }
        outcomes
    }

    async fn process_concurrent(
        &self,
        messages: &[TelemetryMessage],
        shutdown: &ShutdownSignal,
    ) -> Vec<MessageOutcome> {
        let processor = &self.processor;
        // take_while is polled lazily, so the flag is checked as each slot frees up
        stream::iter(messages)
            .take_while(|_| futures::future::ready(!shutdown.is_triggered()))
            .map(|message| processor.process(message))
            .buffer_unordered(self.max_in_flight)
            .boxed()
            .collect()
            .await
    }

    /// Poll until `shutdown` fires, returning the accumulated totals
    pub async fn run(&self, shutdown: ShutdownSignal) -> BatchSummary {
        info!(
            queue = %self.queue.queue_name(),
            mode = ?self.mode,
            max_in_flight = self.max_in_flight,
            batch_size = self.request.max_messages(),
            wait_time_seconds = self.request.wait_time_seconds(),
            visibility_timeout_seconds = self.request.visibility_timeout_seconds(),
            "Starting poll loop"
        );

        let mut totals = BatchSummary::default();
        while !shutdown.is_triggered() {
            let summary = self.run_once(&shutdown).await;
            totals.merge(&summary);

            if summary.is_idle() && shutdown.sleep(self.idle_backoff).await {
                break;
            }
        }

        info!(
            received = totals.received,
            dispatched = totals.dispatched,
            rejected = totals.rejected,
            transient_failures = totals.transient_failures,
            permanent_failures = totals.permanent_failures,
            deleted = totals.deleted,
            delete_failures = totals.delete_failures,
            receive_failures = totals.receive_failures,
            "Poll loop stopped"
        );
        totals
    }
}
