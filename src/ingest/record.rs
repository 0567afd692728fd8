//! Decoded telemetry records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Telemetry payload as published by a device.
///
/// `timestamp` is kept as the producer wrote it; the filter is responsible
/// for turning it into an instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub device_id: String,
    pub timestamp: String,
    pub data: serde_json::Value,
}

/// A record that passed the device and freshness filter.
///
/// Only the filter constructs these, so holding one proves the record is
/// eligible for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRecord {
    record: TelemetryRecord,
    timestamp: DateTime<Utc>,
}

impl AcceptedRecord {
    pub(crate) fn new(record: TelemetryRecord, timestamp: DateTime<Utc>) -> Self {
        Self { record, timestamp }
    }

    pub fn device_id(&self) -> &str {
        &self.record.device_id
    }

    /// Normalized UTC instant of the reading
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.record.data
    }

    pub fn into_record(self) -> TelemetryRecord {
        self.record
    }
}
