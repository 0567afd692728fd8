//! # Orchestration
//!
//! Everything between an accepted telemetry record and the queue delete:
//!
//! - [`WorkflowClient`]: start-execution abstraction, with an HTTP
//!   implementation in [`http_workflow_client`]
//! - [`Dispatcher`]: idempotency key derivation and dispatch outcomes
//! - [`Acknowledger`]: deletes messages whose execution is confirmed
//! - [`MessageProcessor`]: decode, filter, dispatch, acknowledge for one message
//! - [`PollLoop`]: batch receive and processing until shutdown

pub mod acknowledger;
pub mod bootstrap;
pub mod dispatcher;
pub mod error_classifier;
pub mod errors;
pub mod http_workflow_client;
pub mod poll_loop;
pub mod processor;
pub mod workflow_client;

pub use acknowledger::{AckOutcome, Acknowledger};
pub use bootstrap::{build_poll_loop, build_workflow_client};
pub use dispatcher::{execution_name, DispatchFailure, DispatchOutcome, Dispatcher};
pub use error_classifier::ErrorCategory;
pub use errors::{WorkflowError, WorkflowResult};
pub use http_workflow_client::{HttpWorkflowClient, HttpWorkflowClientConfig};
pub use poll_loop::{BatchSummary, PollLoop};
pub use processor::{MessageOutcome, MessageProcessor};
pub use workflow_client::{DispatchRequest, ExecutionInput, StartOutcome, WorkflowClient};
