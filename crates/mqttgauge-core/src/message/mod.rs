//! Message primitives: raw payload -> normalised gauge update.
//!
//! A payload is a single `name:value` pair:
//! - surrounding whitespace is trimmed
//! - exactly one `:` separator is allowed
//! - the name is normalised (see [`normalize_name`])
//! - the value must parse as a finite number
//!
//! All helpers are panic-free: malformed input is reported as `MqttGaugeError`.

pub mod name;
pub mod payload;
pub mod value;

pub use name::normalize_name;
pub use payload::{split_payload, RawUpdate};
pub use value::parse_value;

use crate::error::Result;

/// A parsed, validated update ready for the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Normalised metric name (registry key).
    pub name: String,
    /// Gauge value.
    pub value: f64,
}

/// Split, normalise and parse a raw payload in one go.
pub fn parse_update(payload: &[u8]) -> Result<Update> {
    let raw = split_payload(payload)?;
    let value = parse_value(raw.value)?;
    Ok(Update {
        name: normalize_name(raw.name),
        value,
    })
}
