//! mqttgauge bridge library entry.
//!
//! Wires MQTT ingest, the metric registry, the staleness sweeper, and the
//! HTTP scrape endpoints into one service. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod exporter;
pub mod ingest;
pub mod lifecycle;
pub mod obs;
pub mod ops;
pub mod registry;
pub mod router;
pub mod sweeper;
pub mod transport;
