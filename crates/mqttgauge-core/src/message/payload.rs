//! Wire payload splitting.

use crate::error::{MqttGaugeError, Result};

/// Separator between metric name and value.
pub const FIELD_SEPARATOR: char = ':';

/// Borrowed `name` / `value` fields of a payload, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUpdate<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// Split a payload into its two fields.
///
/// The payload must be UTF-8 and contain exactly one separator once
/// surrounding whitespace is trimmed. Empty fields are let through; an empty
/// name is refused later by the exporter and an empty value by the parser.
pub fn split_payload(payload: &[u8]) -> Result<RawUpdate<'_>> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| MqttGaugeError::Malformed(format!("payload is not utf-8: {e}")))?
        .trim();

    let mut fields = text.split(FIELD_SEPARATOR);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(name), Some(value), None) => Ok(RawUpdate { name, value }),
        _ => Err(MqttGaugeError::Malformed(format!(
            "expected name{FIELD_SEPARATOR}value, got '{text}'"
        ))),
    }
}
