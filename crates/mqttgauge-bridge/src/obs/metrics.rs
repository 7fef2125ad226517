//! Counters describing what the bridge did with its input.

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

use mqttgauge_core::error::{MqttGaugeError, Result};

use crate::exporter::encode_text;

/// Outcome label for an accepted message.
pub const OUTCOME_ACCEPTED: &str = "ACCEPTED";

pub struct BridgeMetrics {
    registry: Registry,
    /// Messages by outcome (`ACCEPTED` or an error code).
    pub messages: IntCounterVec,
    pub gauges_created: IntCounter,
    pub gauges_adopted: IntCounter,
    pub gauges_evicted: IntCounter,
    pub gauges_tracked: IntGauge,
    pub mqtt_connected: IntGauge,
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace("mqttgauge")
}

impl BridgeMetrics {
    pub fn new() -> Result<Self> {
        let messages = IntCounterVec::new(opts("messages_total", "MQTT messages by outcome"), &["outcome"])
            .map_err(internal)?;
        let gauges_created =
            IntCounter::with_opts(opts("gauges_created_total", "Gauges created on first update")).map_err(internal)?;
        let gauges_adopted = IntCounter::with_opts(opts(
            "gauges_adopted_total",
            "Gauges adopted from an existing exporter registration",
        ))
        .map_err(internal)?;
        let gauges_evicted =
            IntCounter::with_opts(opts("gauges_evicted_total", "Stale gauges evicted by the sweeper")).map_err(internal)?;
        let gauges_tracked =
            IntGauge::with_opts(opts("gauges_tracked", "Gauges currently exported")).map_err(internal)?;
        let mqtt_connected =
            IntGauge::with_opts(opts("mqtt_connected", "1 while the MQTT session is up")).map_err(internal)?;

        let registry = Registry::new();
        registry.register(Box::new(messages.clone())).map_err(internal)?;
        registry.register(Box::new(gauges_created.clone())).map_err(internal)?;
        registry.register(Box::new(gauges_adopted.clone())).map_err(internal)?;
        registry.register(Box::new(gauges_evicted.clone())).map_err(internal)?;
        registry.register(Box::new(gauges_tracked.clone())).map_err(internal)?;
        registry.register(Box::new(mqtt_connected.clone())).map_err(internal)?;

        Ok(Self {
            registry,
            messages,
            gauges_created,
            gauges_adopted,
            gauges_evicted,
            gauges_tracked,
            mqtt_connected,
        })
    }

    /// Count one message under `outcome`.
    pub fn observe_message(&self, outcome: &str) {
        self.messages.with_label_values(&[outcome]).inc();
    }

    pub fn render(&self) -> Result<String> {
        encode_text(&self.registry.gather())
    }
}

fn internal(e: prometheus::Error) -> MqttGaugeError {
    MqttGaugeError::Internal(format!("bridge metrics: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn renders_namespaced_counters() {
        let m = BridgeMetrics::new().unwrap();
        m.observe_message(OUTCOME_ACCEPTED);
        m.observe_message("MALFORMED");
        m.gauges_tracked.set(2);

        let text = m.render().unwrap();
        assert!(text.contains("mqttgauge_messages_total{outcome=\"ACCEPTED\"} 1"));
        assert!(text.contains("mqttgauge_messages_total{outcome=\"MALFORMED\"} 1"));
        assert!(text.contains("mqttgauge_gauges_tracked 2"));
    }
}
