//! # Structured Logging Module
//!
//! Environment-aware `tracing` setup plus the per-message outcome record the
//! poll loop emits for every processed message.

use crate::constants::env::ENVIRONMENT;
use crate::messaging::TelemetryMessage;
use crate::orchestration::error_classifier::ErrorCategory;
use crate::orchestration::{AckOutcome, DispatchOutcome, MessageOutcome};
use crate::ingest::RejectionKind;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format switch, `json` or anything else for human-readable
const LOG_FORMAT_VAR: &str = "TELEMETRY_DISPATCH_LOG_FORMAT";

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var(LOG_FORMAT_VAR)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        };

        // A host process (or test harness) may already own the global subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Current deployment environment name
pub fn get_environment() -> String {
    std::env::var(ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Default filter directive for an environment
pub fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Emit one structured record describing what happened to a message.
///
/// Payload contents are never logged; only identifiers and outcome kinds.
pub fn log_message_outcome(
    message: &TelemetryMessage,
    device_id: Option<&str>,
    outcome: &MessageOutcome,
) {
    let message_id = message.id.as_str();
    let receive_count = message.receive_count;
    let device_id = device_id.unwrap_or("-");

    match outcome {
        MessageOutcome::Dispatched { dispatch, ack } => {
            let kind = match dispatch {
                DispatchOutcome::Started { .. } => "started",
                DispatchOutcome::AlreadyExists { .. } => "already_exists",
            };
            tracing::info!(
                message_id,
                device_id,
                receive_count,
                outcome = "dispatched",
                kind,
                execution_name = dispatch.execution_name(),
                ack = ack.as_str(),
                "Telemetry message dispatched"
            );
        }
        MessageOutcome::Rejected { rejection, ack } => {
            let kind = rejection.kind();
            let reason = rejection.to_string();
            match (kind, ack) {
                (_, AckOutcome::Deleted | AckOutcome::DeleteFailed { .. }) => tracing::warn!(
                    message_id,
                    device_id,
                    receive_count,
                    outcome = "discarded",
                    kind = kind.as_str(),
                    reason = %reason,
                    ack = ack.as_str(),
                    "Rejected telemetry message discarded"
                ),
                (RejectionKind::DeviceMismatch, _) => tracing::debug!(
                    message_id,
                    device_id,
                    receive_count,
                    outcome = "rejected",
                    kind = kind.as_str(),
                    reason = %reason,
                    "Telemetry message left for another consumer"
                ),
                _ => tracing::warn!(
                    message_id,
                    device_id,
                    receive_count,
                    outcome = "rejected",
                    kind = kind.as_str(),
                    reason = %reason,
                    "Telemetry message rejected and left for redelivery"
                ),
            }
        }
        MessageOutcome::DispatchFailed(failure) => match failure.category() {
            ErrorCategory::Transient => tracing::warn!(
                message_id,
                device_id,
                receive_count,
                outcome = "dispatch_failed",
                kind = "transient",
                execution_name = %failure.execution_name,
                error = %failure.error,
                "Dispatch failed, message left for retry"
            ),
            ErrorCategory::Permanent => tracing::error!(
                message_id,
                device_id,
                receive_count,
                outcome = "dispatch_failed",
                kind = "permanent",
                execution_name = %failure.execution_name,
                error = %failure.error,
                operator_attention = true,
                "Dispatch failed permanently, retrying will not help"
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{MalformedMessage, Rejection};
    use crate::messaging::{MessageId, ReceiptHandle};
    use crate::orchestration::{DispatchFailure, WorkflowError};

    fn message() -> TelemetryMessage {
        TelemetryMessage::new(
            MessageId::new("m-1"),
            ReceiptHandle::new("h-1"),
            b"{}".to_vec(),
            1,
        )
    }

    #[test]
    fn test_log_level_by_environment() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("staging"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }

    #[test]
    fn test_every_outcome_can_be_logged() {
        init_structured_logging();
        let message = message();

        let outcomes = [
            MessageOutcome::Dispatched {
                dispatch: DispatchOutcome::Started {
                    execution_name: "exec-dev1-m-1".to_string(),
                    execution_id: "run-1".to_string(),
                },
                ack: AckOutcome::Deleted,
            },
            MessageOutcome::Rejected {
                rejection: Rejection::Malformed(MalformedMessage::NotAnObject),
                ack: AckOutcome::Retained,
            },
            MessageOutcome::Rejected {
                rejection: Rejection::Malformed(MalformedMessage::NotAnObject),
                ack: AckOutcome::Deleted,
            },
            MessageOutcome::DispatchFailed(DispatchFailure {
                execution_name: "exec-dev1-m-1".to_string(),
                error: WorkflowError::Throttled {
                    message: "slow down".to_string(),
                },
            }),
            MessageOutcome::DispatchFailed(DispatchFailure {
                execution_name: "exec-dev1-m-1".to_string(),
                error: WorkflowError::Rejected {
                    status: 400,
                    message: "bad workflow".to_string(),
                },
            }),
        ];

        for outcome in &outcomes {
            log_message_outcome(&message, Some("dev1"), outcome);
        }
    }
}
