//! # Telemetry Filter
//!
//! Device-identity and freshness policy, applied in order:
//!
//! 1. the record must come from the configured device,
//! 2. its timestamp must parse to an absolute instant,
//! 3. that instant must not lie after `now` (plus the configured skew).

use super::record::{AcceptedRecord, TelemetryRecord};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Why a decoded record was not dispatched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterRejection {
    #[error("record from device '{actual}' does not match expected device '{expected}'")]
    DeviceMismatch { expected: String, actual: String },

    #[error("timestamp is not a recognised ISO-8601 instant")]
    InvalidTimestamp,

    #[error("timestamp {timestamp} is after processing time {now}")]
    FutureTimestamp {
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct TelemetryFilter {
    expected_device_id: String,
    max_clock_skew: Duration,
}

impl TelemetryFilter {
    pub fn new(expected_device_id: impl Into<String>) -> Self {
        Self {
            expected_device_id: expected_device_id.into(),
            max_clock_skew: Duration::zero(),
        }
    }

    /// Tolerate producer clocks running up to `skew` ahead of ours
    pub fn with_max_clock_skew(mut self, skew: Duration) -> Self {
        self.max_clock_skew = skew.max(Duration::zero());
        self
    }

    pub fn expected_device_id(&self) -> &str {
        &self.expected_device_id
    }

    pub fn evaluate(
        &self,
        record: TelemetryRecord,
        now: DateTime<Utc>,
    ) -> Result<AcceptedRecord, FilterRejection> {
        if record.device_id != self.expected_device_id {
            return Err(FilterRejection::DeviceMismatch {
                expected: self.expected_device_id.clone(),
                actual: record.device_id,
            });
        }

        let timestamp = parse_timestamp(&record.timestamp).ok_or(FilterRejection::InvalidTimestamp)?;

        // A bound past the end of the calendar accepts everything
        let latest = now.checked_add_signed(self.max_clock_skew);
        if latest.is_some_and(|latest| timestamp > latest) {
            return Err(FilterRejection::FutureTimestamp { timestamp, now });
        }

        Ok(AcceptedRecord::new(record, timestamp))
    }
}

/// `%#z` takes `Z`, `+HH`, `+HHMM` and `+HH:MM`
const ZONED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp into UTC.
///
/// Zoned forms (`Z`, `±HH`, `±HHMM` or `±HH:MM`, with or without seconds)
/// are converted; zone-less date-times and bare dates are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.with_timezone(&Utc));
    }
    for format in ZONED_DATETIME_FORMATS {
        if let Ok(zoned) = DateTime::parse_from_str(raw, format) {
            return Some(zoned.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
