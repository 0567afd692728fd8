#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, pgmq in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Telemetry Dispatch
//!
//! Bridge between a durable message queue carrying device telemetry and a
//! workflow-orchestration service that runs one analysis pipeline per event.
//!
//! ## Overview
//!
//! Each received message flows through a fixed pipeline:
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────┐   ┌────────────┐   ┌──────────────┐
//! │ Queue    │──▶│ Decoder │──▶│ Filter │──▶│ Dispatcher │──▶│ Acknowledger │
//! │ receive  │   └─────────┘   └────────┘   └────────────┘   │ (delete)     │
//! └──────────┘                                               └──────────────┘
//! ```
//!
//! A failure at any stage only affects the message being processed; the poll
//! loop moves on to the rest of the batch.
//!
//! ## Delivery guarantees
//!
//! - The queue delivers at least once. The dispatcher derives the execution
//!   name from `(deviceId, messageId)`, so a redelivered message maps to the
//!   same execution and the workflow service collapses duplicates.
//! - A message is deleted only after its execution is confirmed started
//!   (freshly, or already running under the same name).
//! - Records timestamped in the future are never dispatched.
//!
//! ## Module Organization
//!
//! - [`messaging`] - Queue client trait, pgmq and in-memory implementations
//! - [`ingest`] - Body decoding and device/freshness filtering
//! - [`orchestration`] - Workflow client, dispatcher, acknowledger, poll loop
//! - [`config`] - Layered configuration loading and validation
//! - [`logging`] - Structured logging setup and per-message outcome records
//! - [`shutdown`] - Cooperative stop signal
//! - [`clock`] - Injectable time source
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use telemetry_dispatch::clock::SystemClock;
//! use telemetry_dispatch::config::ConfigLoader;
//! use telemetry_dispatch::messaging::PgmqQueueClient;
//! use telemetry_dispatch::orchestration::{build_poll_loop, HttpWorkflowClient};
//! use telemetry_dispatch::shutdown::ShutdownSignal;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::from_env().load()?;
//! let queue = Arc::new(PgmqQueueClient::connect(&config.queue).await?);
//! let workflow = Arc::new(HttpWorkflowClient::new((&config.workflow).into())?);
//!
//! let poll_loop = build_poll_loop(&config, queue, workflow, Arc::new(SystemClock))?;
//! let totals = poll_loop.run(ShutdownSignal::new()).await;
//! println!("dispatched {} executions", totals.dispatched);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod messaging;
pub mod orchestration;
pub mod shutdown;

pub use config::{BridgeConfig, ConfigLoader, ConfigurationError};
pub use error::{BridgeError, Result};
pub use ingest::{FilterRejection, MalformedMessage, TelemetryRecord};
pub use messaging::{QueueClient, QueueError, TelemetryMessage};
pub use orchestration::{
    BatchSummary, DispatchOutcome, MessageOutcome, PollLoop, WorkflowClient, WorkflowError,
};
pub use shutdown::ShutdownSignal;
