//! Exporter collector set.
//!
//! Wraps a `prometheus::Registry` with a name -> gauge index. The index lets a
//! duplicate registration hand back the collector that already owns the name,
//! which the plain registry cannot do (it only reports `AlreadyReg`).
//!
//! This set only ever holds bridged gauges; the bridge's own counters live in
//! [`crate::obs::metrics::BridgeMetrics`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use thiserror::Error;

use mqttgauge_core::error::{MqttGaugeError, Result};

/// Why a gauge could not be added to the collector set.
#[derive(Error)]
pub enum RegisterError {
    /// A gauge with this name is already registered; `existing` is the live handle.
    #[error("gauge '{name}' is already registered")]
    AlreadyRegistered { name: String, existing: Gauge },
    /// The exporter refused the gauge (invalid or reserved name).
    #[error("gauge '{name}' refused: {source}")]
    Refused {
        name: String,
        #[source]
        source: prometheus::Error,
    },
}

impl fmt::Debug for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::AlreadyRegistered { name, existing } => f
                .debug_struct("AlreadyRegistered")
                .field("name", name)
                .field("value", &existing.get())
                .finish(),
            RegisterError::Refused { name, source } => f
                .debug_struct("Refused")
                .field("name", name)
                .field("source", source)
                .finish(),
        }
    }
}

/// Build an unregistered gauge for `name`.
///
/// Fails when `name` is not a valid Prometheus metric name (empty, leading
/// digit, characters outside `[a-zA-Z0-9_:]`).
pub fn new_gauge(name: &str) -> std::result::Result<Gauge, RegisterError> {
    Gauge::with_opts(Opts::new(name, format!("Last value received for {name}"))).map_err(|source| {
        RegisterError::Refused {
            name: name.to_string(),
            source,
        }
    })
}

#[derive(Default)]
pub struct Exporter {
    registry: Registry,
    index: Mutex<HashMap<String, Gauge>>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self) -> MutexGuard<'_, HashMap<String, Gauge>> {
        // The index is updated only after the registry call succeeds.
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `gauge` under `name` and return the handle now serving it.
    pub fn register(&self, name: &str, gauge: Gauge) -> std::result::Result<Gauge, RegisterError> {
        let mut index = self.index();
        if let Some(existing) = index.get(name) {
            return Err(RegisterError::AlreadyRegistered {
                name: name.to_string(),
                existing: existing.clone(),
            });
        }

        self.registry
            .register(Box::new(gauge.clone()))
            .map_err(|source| RegisterError::Refused {
                name: name.to_string(),
                source,
            })?;

        index.insert(name.to_string(), gauge.clone());
        Ok(gauge)
    }

    /// Remove the gauge registered under `name`.
    ///
    /// Only names previously accepted are ever unregistered, so any failure
    /// here is an invariant violation.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut index = self.index();
        let gauge = index
            .get(name)
            .cloned()
            .ok_or_else(|| MqttGaugeError::Internal(format!("gauge '{name}' is not registered")))?;

        self.registry
            .unregister(Box::new(gauge))
            .map_err(|e| MqttGaugeError::Internal(format!("unregister '{name}' failed: {e}")))?;

        index.remove(name);
        Ok(())
    }

    pub fn registered_names(&self) -> BTreeSet<String> {
        self.index().keys().cloned().collect()
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render the collector set in Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        encode_text(&self.gather())
    }
}

/// Encode metric families with the text encoder.
pub fn encode_text(families: &[MetricFamily]) -> Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(families, &mut buf)
        .map_err(|e| MqttGaugeError::Internal(format!("encode metrics failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| MqttGaugeError::Internal(format!("metrics are not utf-8: {e}")))
}
