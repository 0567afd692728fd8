//! # Dispatcher
//!
//! Derives the idempotency key for an accepted record and asks the workflow
//! service to start one execution under it.
//!
//! The key is `exec-{deviceId}-{messageId}`. Because it only depends on the
//! device and the queue message id, every redelivery of a message (and every
//! concurrent poller that happens to receive it) asks for the same execution,
//! and the workflow service starts at most one.

use super::error_classifier::ErrorCategory;
use super::errors::WorkflowError;
use super::workflow_client::{DispatchRequest, ExecutionInput, StartOutcome, WorkflowClient};
use crate::constants::execution::{MAX_NAME_LENGTH, NAME_NAMESPACE, NAME_PREFIX};
use crate::ingest::AcceptedRecord;
use crate::messaging::MessageId;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Room left for the device id once prefix, separator and hash are placed
const HASHED_DEVICE_PREFIX_LENGTH: usize = MAX_NAME_LENGTH - NAME_PREFIX.len() - 1 - 32;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Execution name for a message.
///
/// Names that fit the service's limits (80 characters of `[A-Za-z0-9_-]`)
/// are `exec-{device_id}-{message_id}` verbatim. Anything else becomes
/// `exec-{sanitized device prefix}-{uuid v5 of the verbatim name}`, which is
/// still deterministic and collision-resistant.
pub fn execution_name(device_id: &str, message_id: &str) -> String {
    let raw = format!("{NAME_PREFIX}{device_id}-{message_id}");
    if raw.len() <= MAX_NAME_LENGTH && raw.chars().all(is_name_char) {
        return raw;
    }

    let device_prefix: String = device_id
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .take(HASHED_DEVICE_PREFIX_LENGTH)
        .collect();
    let hash = Uuid::new_v5(&NAME_NAMESPACE, raw.as_bytes()).simple();

    format!("{NAME_PREFIX}{device_prefix}-{hash}")
}

/// Confirmed execution for a message; both variants make it safe to delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Started {
        execution_name: String,
        execution_id: String,
    },
    AlreadyExists {
        execution_name: String,
    },
}

impl DispatchOutcome {
    pub fn execution_name(&self) -> &str {
        match self {
            DispatchOutcome::Started { execution_name, .. }
            | DispatchOutcome::AlreadyExists { execution_name } => execution_name,
        }
    }
}

/// Execution could not be confirmed; the message must stay in the queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dispatch of {execution_name} failed: {error}")]
pub struct DispatchFailure {
    pub execution_name: String,
    pub error: WorkflowError,
}

impl DispatchFailure {
    pub fn category(&self) -> ErrorCategory {
        self.error.category()
    }
}

pub struct Dispatcher {
    client: Arc<dyn WorkflowClient>,
    workflow_id: String,
    subject_id: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workflow_id", &self.workflow_id)
            .field("subject_id", &self.subject_id)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn WorkflowClient>,
        workflow_id: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            workflow_id: workflow_id.into(),
            subject_id: subject_id.into(),
        }
    }

    pub fn request_for(&self, record: AcceptedRecord, message_id: &MessageId) -> DispatchRequest {
        let execution_name = execution_name(record.device_id(), message_id.as_str());
        DispatchRequest {
            execution_name,
            workflow_id: self.workflow_id.clone(),
            input: ExecutionInput {
                patient_id: self.subject_id.clone(),
                data: record.into_record().data,
            },
        }
    }

    pub async fn dispatch(
        &self,
        record: AcceptedRecord,
        message_id: &MessageId,
    ) -> Result<DispatchOutcome, DispatchFailure> {
        let request = self.request_for(record, message_id);

        match self.client.start_execution(&request).await {
            Ok(StartOutcome::Started { execution_id }) => Ok(DispatchOutcome::Started {
                execution_name: request.execution_name,
                execution_id,
            }),
            Ok(StartOutcome::AlreadyExists) => Ok(DispatchOutcome::AlreadyExists {
                execution_name: request.execution_name,
            }),
            Err(error) => Err(DispatchFailure {
                execution_name: request.execution_name,
                error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{TelemetryFilter, TelemetryRecord};
    use crate::orchestration::errors::WorkflowResult;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<Vec<WorkflowResult<StartOutcome>>>,
        requests: Mutex<Vec<DispatchRequest>>,
    }

    #[async_trait]
    impl WorkflowClient for ScriptedClient {
        async fn start_execution(&self, request: &DispatchRequest) -> WorkflowResult<StartOutcome> {
            self.requests.lock().push(request.clone());
            self.replies.lock().remove(0)
        }
    }

    fn accepted(device: &str) -> AcceptedRecord {
        TelemetryFilter::new(device)
            .evaluate(
                TelemetryRecord {
                    device_id: device.to_string(),
                    timestamp: "2024-01-01T00:00:00Z".to_string(),
                    data: json!({"x": 1}),
                },
                Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_plain_execution_name() {
        assert_eq!(execution_name("dev1", "m-1"), "exec-dev1-m-1");
        assert_eq!(
            execution_name("IoTSimulator", "6f1c2a9e-3b7d-4e5f-8a1b-2c3d4e5f6a7b"),
            "exec-IoTSimulator-6f1c2a9e-3b7d-4e5f-8a1b-2c3d4e5f6a7b"
        );
    }

    #[test]
    fn test_long_or_unsafe_names_are_hashed() {
        let long_device = "d".repeat(100);
        let name = execution_name(&long_device, "m-1");
        assert!(name.len() <= MAX_NAME_LENGTH);
        assert!(name.starts_with("exec-ddd"));
        assert!(name.chars().all(is_name_char));
        assert_eq!(name, execution_name(&long_device, "m-1"));
        assert_ne!(name, execution_name(&long_device, "m-2"));

        let name = execution_name("dev/1", "m:1");
        assert!(name.starts_with("exec-dev_1-"));
        assert!(name.chars().all(is_name_char));
        assert_ne!(name, execution_name("dev_1", "m_1"));
    }

    #[test]
    fn test_name_at_length_limit_is_kept() {
        let message_id = "m".repeat(MAX_NAME_LENGTH - "exec-dev1-".len());
        let name = execution_name("dev1", &message_id);
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        assert_eq!(name, format!("exec-dev1-{message_id}"));
    }

    #[test]
    fn test_request_shape() {
        let dispatcher = Dispatcher::new(Arc::new(ScriptedClient::default()), "wf", "patient-1");
        let request = dispatcher.request_for(accepted("dev1"), &MessageId::new("m-1"));

        assert_eq!(request.execution_name, "exec-dev1-m-1");
        assert_eq!(request.workflow_id, "wf");
        assert_eq!(
            serde_json::to_value(&request.input).unwrap(),
            json!({"patientId": "patient-1", "data": {"x": 1}})
        );
    }

    #[tokio::test]
    async fn test_dispatch_outcomes() {
        let client = Arc::new(ScriptedClient::default());
        client.replies.lock().extend([
            Ok(StartOutcome::Started {
                execution_id: "run-1".to_string(),
            }),
            Ok(StartOutcome::AlreadyExists),
            Err(WorkflowError::from_status(503, "down")),
        ]);
        let dispatcher = Dispatcher::new(client.clone(), "wf", "patient-1");
        let id = MessageId::new("m-1");

        let started = dispatcher.dispatch(accepted("dev1"), &id).await.unwrap();
        assert_eq!(
            started,
            DispatchOutcome::Started {
                execution_name: "exec-dev1-m-1".to_string(),
                execution_id: "run-1".to_string(),
            }
        );

        let existing = dispatcher.dispatch(accepted("dev1"), &id).await.unwrap();
        assert_eq!(existing.execution_name(), "exec-dev1-m-1");

        let failure = dispatcher.dispatch(accepted("dev1"), &id).await.unwrap_err();
        assert_eq!(failure.category(), ErrorCategory::Transient);
        assert_eq!(failure.execution_name, "exec-dev1-m-1");

        let names: Vec<_> = client
            .requests
            .lock()
            .iter()
            .map(|r| r.execution_name.clone())
            .collect();
        assert_eq!(names, vec!["exec-dev1-m-1"; 3]);
    }
}
