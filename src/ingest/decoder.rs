//! # Message Decoder
//!
//! Turns a raw queue body into a [`TelemetryRecord`].
//!
//! Expected shape:
//!
//! ```json
//! {"deviceId": "dev1", "timestamp": "2024-01-01T00:00:00Z", "data": {"x": 1}}
//! ```
//!
//! `deviceId` must be a string, `timestamp` a string (parsed later by the
//! filter) and `data` any JSON value except `null`. An empty `deviceId` is
//! well-formed; the filter rejects it as a device mismatch. Other top-level
//! fields are ignored. Rejections name the offending field but never echo
//! payload contents.

use super::record::TelemetryRecord;
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEVICE_ID_FIELD: &str = "deviceId";
pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const DATA_FIELD: &str = "data";

/// Why a body could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMessage {
    #[error("body is not valid JSON (line {line}, column {column})")]
    InvalidJson { line: usize, column: usize },

    #[error("body is JSON but not an object")]
    NotAnObject,

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

pub fn decode(body: &[u8]) -> Result<TelemetryRecord, MalformedMessage> {
    let value: Value = serde_json::from_slice(body).map_err(|e| MalformedMessage::InvalidJson {
        line: e.line(),
        column: e.column(),
    })?;

    let Value::Object(mut fields) = value else {
        return Err(MalformedMessage::NotAnObject);
    };

    let device_id = take_string(&mut fields, DEVICE_ID_FIELD)?;
    let timestamp = take_string(&mut fields, TIMESTAMP_FIELD)?;
    let data = take_present(&mut fields, DATA_FIELD)?;

    Ok(TelemetryRecord {
        device_id,
        timestamp,
        data,
    })
}

/// Remove a field, treating `null` the same as absent
fn take_present(fields: &mut Map<String, Value>, field: &'static str) -> Result<Value, MalformedMessage> {
    match fields.remove(field) {
        None | Some(Value::Null) => Err(MalformedMessage::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn take_string(fields: &mut Map<String, Value>, field: &'static str) -> Result<String, MalformedMessage> {
    match take_present(fields, field)? {
        Value::String(s) => Ok(s),
        _ => Err(MalformedMessage::InvalidField {
            field,
            expected: "a string",
        }),
    }
}
