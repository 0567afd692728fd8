//! # Poll Loop Bootstrap
//!
//! Wires a [`PollLoop`] from a validated [`BridgeConfig`] and the injected
//! queue, workflow and clock implementations. The same entry point serves
//! the binary (pgmq + HTTP) and tests (in-memory queue + mocks).

use super::acknowledger::Acknowledger;
use super::dispatcher::Dispatcher;
use super::http_workflow_client::HttpWorkflowClient;
use super::poll_loop::PollLoop;
use super::processor::MessageProcessor;
use super::workflow_client::WorkflowClient;
use crate::clock::Clock;
use crate::config::{BridgeConfig, WorkflowConfig};
use crate::error::Result;
use crate::ingest::TelemetryFilter;
use crate::messaging::QueueClient;
use std::sync::Arc;
use tracing::info;

/// HTTP client for the configured workflow service
pub fn build_workflow_client(config: &WorkflowConfig) -> Result<HttpWorkflowClient> {
    let client = HttpWorkflowClient::new(config.into())?;
    info!(base_url = %config.base_url, "Workflow client configured");
    Ok(client)
}

pub fn build_poll_loop(
    config: &BridgeConfig,
    queue: Arc<dyn QueueClient>,
    workflow: Arc<dyn WorkflowClient>,
    clock: Arc<dyn Clock>,
) -> Result<PollLoop> {
    let request = config.queue.receive_request()?;

    let filter = TelemetryFilter::new(config.filter.expected_device_id.clone())
        .with_max_clock_skew(config.filter.max_clock_skew());
    let dispatcher = Dispatcher::new(
        workflow,
        config.workflow.workflow_id.clone(),
        config.filter.subject_id.clone(),
    );
    let processor = MessageProcessor::new(filter, dispatcher, Acknowledger::new(queue.clone()), clock)
        .with_rejection_policy(config.rejections);

    info!(
        queue = %queue.queue_name(),
        workflow_id = %config.workflow.workflow_id,
        expected_device_id = %config.filter.expected_device_id,
        rejections = ?config.rejections,
        "Poll loop assembled"
    );

    Ok(PollLoop::new(queue, processor, request)
        .with_mode(config.processing.mode, config.processing.max_in_flight)
        .with_idle_backoff(config.processing.idle_backoff()))
}
