use proptest::prelude::*;
use serde_json::{json, Value};

/// Device ids as producers actually send them
pub fn device_id_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_-]{0,31}"
}

/// Arbitrary non-empty device ids, including characters execution names reject
pub fn any_device_id_strategy() -> impl Strategy<Value = String> {
    "\\PC{1,120}"
}

/// Queue message ids: pgmq integers or uuid-like strings
pub fn message_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u64..u64::MAX).prop_map(|id| id.to_string()),
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        "\\PC{1,80}",
    ]
}

/// Small JSON payloads
pub fn data_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,16}".prop_map(Value::from),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(|v| json!(v)),
        ("[a-z]{1,8}", any::<i32>()).prop_map(|(k, v)| json!({ k: v })),
    ]
}
