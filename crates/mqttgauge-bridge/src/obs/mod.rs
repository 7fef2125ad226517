//! Bridge self-observability.
//!
//! The bridge's own counters are kept in a separate `prometheus::Registry`
//! so the main collector set holds nothing but bridged gauges.

pub mod metrics;
