//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod strategies;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use telemetry_dispatch::clock::FixedClock;
use telemetry_dispatch::config::{
    BridgeConfig, FilterConfig, ProcessingConfig, ProcessingMode, QueueConfig, WorkflowConfig,
};
use telemetry_dispatch::messaging::QueueClient;
use telemetry_dispatch::orchestration::{build_poll_loop, PollLoop, WorkflowClient};

pub const DEVICE: &str = "dev1";
pub const SUBJECT: &str = "patient-123";
pub const WORKFLOW_ID: &str = "ecg-analysis";

/// 2024-01-01T00:00:01Z, one second after the standard fixture timestamp
pub fn processing_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap()
}

/// Configuration with non-blocking receives and a short idle backoff
pub fn test_config(expected_device: &str) -> BridgeConfig {
    BridgeConfig {
        queue: QueueConfig {
            database_url: "postgresql://localhost/unused".to_string(),
            queue_name: "telemetry_test".to_string(),
            batch_size: 10,
            wait_time_seconds: 0,
            visibility_timeout_seconds: 30,
            ..QueueConfig::default()
        },
        workflow: WorkflowConfig {
            base_url: "http://localhost:8080".to_string(),
            workflow_id: WORKFLOW_ID.to_string(),
            ..WorkflowConfig::default()
        },
        filter: FilterConfig {
            expected_device_id: expected_device.to_string(),
            subject_id: SUBJECT.to_string(),
            ..FilterConfig::default()
        },
        processing: ProcessingConfig {
            mode: ProcessingMode::Sequential,
            max_in_flight: 4,
            idle_backoff_ms: 10,
        },
        ..BridgeConfig::default()
    }
}

pub fn poll_loop(
    config: &BridgeConfig,
    queue: Arc<dyn QueueClient>,
    workflow: Arc<dyn WorkflowClient>,
    now: DateTime<Utc>,
) -> PollLoop {
    build_poll_loop(config, queue, workflow, Arc::new(FixedClock::new(now)))
        .expect("test configuration is valid")
}

pub fn telemetry_body(device_id: &str, timestamp: &str, data: Value) -> Vec<u8> {
    json!({"deviceId": device_id, "timestamp": timestamp, "data": data})
        .to_string()
        .into_bytes()
}

/// The canonical accepted message: `dev1` at 2024-01-01T00:00:00Z
pub fn valid_body() -> Vec<u8> {
    telemetry_body(DEVICE, "2024-01-01T00:00:00Z", json!({"x": 1}))
}
