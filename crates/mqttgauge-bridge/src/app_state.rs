//! Shared application state for the bridge.
//!
//! Owns the exporter, the metric registry built on it, and the bridge's own
//! counters. Cloned into every axum handler and background task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mqttgauge_core::error::Result;

use crate::config::BridgeConfig;
use crate::exporter::Exporter;
use crate::obs::metrics::BridgeMetrics;
use crate::registry::MetricRegistry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<MetricRegistry>,
    metrics: Arc<BridgeMetrics>,
}

struct AppStateInner {
    cfg: BridgeConfig,
    connected: AtomicBool,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: BridgeConfig) -> Result<Self> {
        let metrics = Arc::new(BridgeMetrics::new()?);
        let exporter = Arc::new(Exporter::new());
        let registry =
            Arc::new(MetricRegistry::new(exporter).with_size_gauge(metrics.gauges_tracked.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                connected: AtomicBool::new(false),
            }),
            registry,
            metrics,
        })
    }

    pub fn cfg(&self) -> &BridgeConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn exporter(&self) -> Arc<Exporter> {
        self.registry.exporter()
    }

    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Record MQTT session state.
    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::Relaxed);
        self.metrics.mqtt_connected.set(i64::from(connected));
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }
}
