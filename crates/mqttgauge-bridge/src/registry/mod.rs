//! Metric registry: normalised name -> live gauge + last-seen time.
//!
//! One mutex guards the entry map, and every exporter registration and
//! unregistration happens while it is held, so the map and the exporter's
//! collector set always hold the same names. The lock is never held across
//! an `.await` or any I/O.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use prometheus::{Gauge, IntGauge};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use mqttgauge_core::error::{MqttGaugeError, Result};

use crate::exporter::{self, Exporter, RegisterError};

/// What an upsert did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New gauge created and registered.
    Created,
    /// Gauge already registered outside this registry; adopted.
    Adopted,
    /// Existing entry refreshed.
    Updated,
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSample {
    pub name: String,
    pub value: f64,
    pub age: Duration,
}

struct MetricEntry {
    gauge: Gauge,
    last_updated: Instant,
}

/// `now - last_updated > threshold`, i.e. last update strictly before `now - threshold`.
fn is_stale(last_updated: Instant, threshold: Duration, now: Instant) -> bool {
    now.saturating_duration_since(last_updated) > threshold
}

pub struct MetricRegistry {
    entries: Mutex<HashMap<String, MetricEntry>>,
    exporter: Arc<Exporter>,
    /// Mirrors the entry count; written only while `entries` is locked.
    size_gauge: Option<IntGauge>,
}

impl MetricRegistry {
    pub fn new(exporter: Arc<Exporter>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            exporter,
            size_gauge: None,
        }
    }

    /// Keep `gauge` equal to the number of entries.
    pub fn with_size_gauge(mut self, gauge: IntGauge) -> Self {
        gauge.set(0);
        self.size_gauge = Some(gauge);
        self
    }

    fn publish_size(&self, entries: &HashMap<String, MetricEntry>) {
        if let Some(gauge) = &self.size_gauge {
            gauge.set(entries.len() as i64);
        }
    }

    pub fn exporter(&self) -> Arc<Exporter> {
        Arc::clone(&self.exporter)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MetricEntry>> {
        // Map and exporter are updated in a consistent order; a panic elsewhere
        // cannot leave them out of step.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set `name` to `value`, creating and registering its gauge on first sight.
    pub fn upsert(&self, name: &str, value: f64) -> Result<UpsertOutcome> {
        self.upsert_at(name, value, Instant::now())
    }

    pub fn upsert_at(&self, name: &str, value: f64, now: Instant) -> Result<UpsertOutcome> {
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(name) {
            entry.gauge.set(value);
            entry.last_updated = now;
            return Ok(UpsertOutcome::Updated);
        }

        let registered = exporter::new_gauge(name).and_then(|g| self.exporter.register(name, g));
        let (gauge, outcome) = match registered {
            Ok(gauge) => {
                info!(name, "registered new gauge");
                (gauge, UpsertOutcome::Created)
            }
            Err(RegisterError::AlreadyRegistered { existing, .. }) => {
                warn!(name, "gauge already registered with exporter, adopting existing collector");
                (existing, UpsertOutcome::Adopted)
            }
            Err(e @ RegisterError::Refused { .. }) => {
                return Err(MqttGaugeError::Rejected(e.to_string()));
            }
        };

        gauge.set(value);
        entries.insert(
            name.to_string(),
            MetricEntry {
                gauge,
                last_updated: now,
            },
        );
        self.publish_size(&entries);
        Ok(outcome)
    }

    /// Names whose last update is older than `now - threshold`. Does not mutate.
    pub fn snapshot_stale_names(&self, threshold: Duration, now: Instant) -> BTreeSet<String> {
        self.lock()
            .iter()
            .filter(|(_, e)| is_stale(e.last_updated, threshold, now))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Unregister and drop every listed entry that is still stale.
    ///
    /// Staleness is checked again under the lock: an entry refreshed after
    /// `names` was taken survives. Unknown names are skipped. Returns the
    /// number of evicted entries.
    pub fn evict(&self, names: &BTreeSet<String>, threshold: Duration, now: Instant) -> Result<usize> {
        let mut entries = self.lock();
        let mut evicted = 0;

        for name in names {
            let Some(entry) = entries.get(name) else { continue };
            if !is_stale(entry.last_updated, threshold, now) {
                debug!(name = %name, "gauge refreshed since snapshot, keeping");
                continue;
            }

            self.exporter.unregister(name)?;
            entries.remove(name);
            evicted += 1;
            info!(name = %name, "evicted stale gauge");
        }

        if evicted > 0 {
            self.publish_size(&entries);
        }
        Ok(evicted)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.lock().get(name).map(|e| e.gauge.get())
    }

    pub fn last_updated(&self, name: &str) -> Option<Instant> {
        self.lock().get(name).map(|e| e.last_updated)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Consistent view of all entries, sorted by name.
    pub fn snapshot(&self) -> Vec<GaugeSample> {
        let now = Instant::now();
        let mut samples: Vec<GaugeSample> = self
            .lock()
            .iter()
            .map(|(name, e)| GaugeSample {
                name: name.clone(),
                value: e.gauge.get(),
                age: now.saturating_duration_since(e.last_updated),
            })
            .collect();
        samples.sort_by(|a, b| a.name.cmp(&b.name));
        samples
    }
}
