//! Workflow service abstraction.

use super::errors::WorkflowResult;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Input object handed to every execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionInput {
    pub patient_id: String,
    pub data: Value,
}

/// Request to start one workflow execution
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    /// Idempotency key; the service runs at most one execution per name
    pub execution_name: String,
    pub workflow_id: String,
    pub input: ExecutionInput,
}

/// Successful answer to a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { execution_id: String },
    /// An execution with this name was started earlier
    AlreadyExists,
}

#[async_trait]
pub trait WorkflowClient: Send + Sync + 'static {
    async fn start_execution(&self, request: &DispatchRequest) -> WorkflowResult<StartOutcome>;
}
