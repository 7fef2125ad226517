//! mqttgauge core: transport-agnostic message primitives and the shared error type.
//!
//! This crate defines how a raw `name:value` payload becomes a normalised
//! gauge update, plus the error surface shared with the bridge. It carries no
//! runtime or exporter dependencies so the parsing rules can be tested and
//! reused on their own.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Payloads are producer-controlled, so every malformed input surfaces as
//! `MqttGaugeError` instead of bringing the bridge down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod message;

/// Shared result type.
pub use error::{Result, MqttGaugeError};
