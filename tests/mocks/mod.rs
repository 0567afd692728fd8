//! Test doubles for the workflow service and the queue.
//!
//! `MockWorkflowService` behaves like a real orchestrator with respect to
//! execution names: the first start under a name creates an execution, every
//! later start under the same name reports `AlreadyExists`. Failures can be
//! scripted ahead of time.
//!
//! `RecordingQueue` wraps an [`InMemoryQueue`], records every delete and can
//! be told to fail receives or deletes.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use telemetry_dispatch::messaging::{
    InMemoryQueue, MessagingResult, QueueClient, QueueError, ReceiptHandle, ReceiveRequest,
    TelemetryMessage,
};
use telemetry_dispatch::orchestration::{
    DispatchRequest, StartOutcome, WorkflowClient, WorkflowError, WorkflowResult,
};
use telemetry_dispatch::shutdown::ShutdownSignal;

#[derive(Default)]
pub struct MockWorkflowService {
    /// execution name -> execution id
    executions: DashMap<String, String>,
    requests: Mutex<Vec<DispatchRequest>>,
    scripted_failures: Mutex<VecDeque<WorkflowError>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    /// Triggered when the first start request arrives
    shutdown_on_call: Option<ShutdownSignal>,
}

impl MockWorkflowService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer each start only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Request shutdown as soon as a dispatch is in flight
    pub fn with_shutdown_on_call(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown_on_call = Some(shutdown);
        self
    }

    /// Fail the next start requests with `errors`, in order
    pub fn fail_next(&self, errors: impl IntoIterator<Item = WorkflowError>) {
        self.scripted_failures.lock().extend(errors);
    }

    /// Pretend an execution under `name` was started by someone else
    pub fn preload_execution(&self, name: &str) {
        self.executions
            .insert(name.to_string(), format!("preloaded-{name}"));
    }

    pub fn execution_count(&self) -> usize {
        self.executions.len()
    }

    pub fn has_execution(&self, name: &str) -> bool {
        self.executions.contains_key(name)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().clone()
    }

    pub fn requested_names(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.execution_name)
            .collect()
    }
}

#[async_trait]
impl WorkflowClient for MockWorkflowService {
    async fn start_execution(&self, request: &DispatchRequest) -> WorkflowResult<StartOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());

        if let Some(shutdown) = &self.shutdown_on_call {
            shutdown.trigger();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.scripted_failures.lock().pop_front() {
            return Err(error);
        }

        let mut created = false;
        self.executions
            .entry(request.execution_name.clone())
            .or_insert_with(|| {
                created = true;
                format!("run-{call}")
            });

        if created {
            Ok(StartOutcome::Started {
                execution_id: format!("run-{call}"),
            })
        } else {
            Ok(StartOutcome::AlreadyExists)
        }
    }
}

pub struct RecordingQueue {
    inner: Arc<InMemoryQueue>,
    deletes: Mutex<Vec<ReceiptHandle>>,
    fail_deletes: AtomicBool,
    failing_receives: AtomicUsize,
}

impl RecordingQueue {
    pub fn new(inner: Arc<InMemoryQueue>) -> Self {
        Self {
            inner,
            deletes: Mutex::new(Vec::new()),
            fail_deletes: AtomicBool::new(false),
            failing_receives: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &InMemoryQueue {
        &self.inner
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_receives(&self, count: usize) {
        self.failing_receives.store(count, Ordering::SeqCst);
    }

    /// Every delete attempted, including failed ones
    pub fn delete_calls(&self) -> Vec<ReceiptHandle> {
        self.deletes.lock().clone()
    }
}

#[async_trait]
impl QueueClient for RecordingQueue {
    async fn receive(&self, request: &ReceiveRequest) -> MessagingResult<Vec<TelemetryMessage>> {
        let failing = self
            .failing_receives
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(QueueError::database_connection("simulated receive failure"));
        }
        self.inner.receive(request).await
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> MessagingResult<()> {
        self.deletes.lock().push(receipt_handle.clone());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(QueueError::queue_operation(
                self.inner.queue_name(),
                "delete",
                "simulated delete failure",
            ));
        }
        self.inner.delete(receipt_handle).await
    }

    fn queue_name(&self) -> &str {
        self.inner.queue_name()
    }
}
