//! Transport layer.
//!
//! - `mqtt`: broker session, resubscribe on every connect, payload handoff to the ingest queue

pub mod mqtt;
