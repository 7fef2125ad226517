//! Top-level facade crate for mqttgauge.
//!
//! Re-exports the message primitives and the bridge library so users can depend on a single crate.

pub mod core {
    pub use mqttgauge_core::*;
}

pub mod bridge {
    pub use mqttgauge_bridge::*;
}
