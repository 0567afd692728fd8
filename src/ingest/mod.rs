//! # Ingest Module
//!
//! Decoding and filtering of telemetry message bodies. Nothing here performs
//! I/O: both stages are pure functions of the body, the configured device and
//! the processing instant.

pub mod decoder;
pub mod filter;
pub mod record;

pub use decoder::{decode, MalformedMessage};
pub use filter::{parse_timestamp, FilterRejection, TelemetryFilter};
pub use record::{AcceptedRecord, TelemetryRecord};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a decode or filter rejection, used for logging and for the
/// per-category rejection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Malformed,
    InvalidTimestamp,
    DeviceMismatch,
    FutureTimestamp,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::Malformed => "malformed_message",
            RejectionKind::InvalidTimestamp => "invalid_timestamp",
            RejectionKind::DeviceMismatch => "device_mismatch",
            RejectionKind::FutureTimestamp => "future_timestamp",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message that will not be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Malformed(MalformedMessage),
    Filtered(FilterRejection),
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::Malformed(_) => RejectionKind::Malformed,
            Rejection::Filtered(FilterRejection::InvalidTimestamp) => RejectionKind::InvalidTimestamp,
            Rejection::Filtered(FilterRejection::DeviceMismatch { .. }) => {
                RejectionKind::DeviceMismatch
            }
            Rejection::Filtered(FilterRejection::FutureTimestamp { .. }) => {
                RejectionKind::FutureTimestamp
            }
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed(reason) => write!(f, "{reason}"),
            Rejection::Filtered(reason) => write!(f, "{reason}"),
        }
    }
}

impl From<MalformedMessage> for Rejection {
    fn from(reason: MalformedMessage) -> Self {
        Rejection::Malformed(reason)
    }
}

impl From<FilterRejection> for Rejection {
    fn from(reason: FilterRejection) -> Self {
        Rejection::Filtered(reason)
    }
}
