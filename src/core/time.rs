//! Timestamps and the JSON response envelope shared by CLI commands.

use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

/// Wraps a command result; keys of `extra` are merged into the top level.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": "1.0.0",
        "ts": now_epoch_z(),
        "event_id": Ulid::new().to_string(),
        "cmd": cmd,
        "status": status
    });
    match (base.as_object_mut(), extra) {
        (Some(base_obj), JsonValue::Object(extra_obj)) => base_obj.extend(extra_obj),
        (Some(base_obj), JsonValue::Null) => {
            base_obj.insert("result".to_string(), JsonValue::Null);
        }
        (Some(base_obj), other) => {
            base_obj.insert("result".to_string(), other);
        }
        (None, _) => {}
    }
    base
}
