//! Staleness sweeper.
//!
//! `WAIT(interval) -> SWEEP -> WAIT(interval) -> ...` until shutdown.
//! A sweep takes the registry lock only inside `snapshot_stale_names` and
//! `evict`, so ingest keeps flowing between the two calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use mqttgauge_core::error::Result;

use crate::config::SweeperSection;
use crate::obs::metrics::BridgeMetrics;
use crate::registry::MetricRegistry;

pub struct Sweeper {
    registry: Arc<MetricRegistry>,
    metrics: Arc<BridgeMetrics>,
    interval: Duration,
    stale_after: Duration,
}

impl Sweeper {
    pub fn new(
        registry: Arc<MetricRegistry>,
        metrics: Arc<BridgeMetrics>,
        interval: Duration,
        stale_after: Duration,
    ) -> Self {
        Self {
            registry,
            metrics,
            interval,
            stale_after,
        }
    }

    pub fn from_config(registry: Arc<MetricRegistry>, metrics: Arc<BridgeMetrics>, cfg: &SweeperSection) -> Self {
        Self::new(registry, metrics, cfg.interval(), cfg.stale_after())
    }

    /// One sweep as of `now`. Returns the number of evicted gauges.
    pub fn sweep_at(&self, now: Instant) -> Result<usize> {
        let stale = self.registry.snapshot_stale_names(self.stale_after, now);
        if stale.is_empty() {
            return Ok(0);
        }
        debug!(candidates = stale.len(), "stale gauges found");

        let evicted = self.registry.evict(&stale, self.stale_after, now)?;
        self.metrics.gauges_evicted.inc_by(evicted as u64);
        if evicted > 0 {
            info!(evicted, "sweep finished");
        }
        Ok(evicted)
    }

    /// Sweep every `interval` until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// An eviction error means the exporter and the registry disagree; the
    /// loop stops and hands the error to the caller.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut tick = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            stale_after_secs = self.stale_after.as_secs(),
            "sweeper started"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.sweep_at(Instant::now()) {
                        error!(error = %e, "sweep failed");
                        return Err(e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("sweeper stopped");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exporter::Exporter;

    const MIN: Duration = Duration::from_secs(60);

    fn setup(interval: Duration, stale_after: Duration) -> (Arc<MetricRegistry>, Arc<BridgeMetrics>, Sweeper) {
        let metrics = Arc::new(BridgeMetrics::new().unwrap());
        let registry = Arc::new(
            MetricRegistry::new(Arc::new(Exporter::new())).with_size_gauge(metrics.gauges_tracked.clone()),
        );
        let sweeper = Sweeper::new(Arc::clone(&registry), Arc::clone(&metrics), interval, stale_after);
        (registry, metrics, sweeper)
    }

    #[test]
    fn sweep_evicts_everything_past_threshold() {
        let (registry, metrics, sweeper) = setup(MIN, 5 * MIN);
        let t0 = Instant::now();
        registry.upsert_at("temp", 21.5, t0).unwrap();
        registry.upsert_at("temp", 22.0, t0 + Duration::from_secs(1)).unwrap();
        registry.upsert_at("humidity", 40.0, t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("temp"), Some(22.0));

        let evicted = sweeper.sweep_at(t0 + Duration::from_secs(2) + 6 * MIN).unwrap();

        assert_eq!(evicted, 2);
        assert!(registry.is_empty());
        assert!(registry.exporter().registered_names().is_empty());
        assert_eq!(metrics.gauges_evicted.get(), 2);
        assert_eq!(metrics.gauges_tracked.get(), 0);
    }

    #[test]
    fn sweep_keeps_recent_entries() {
        let (registry, _, sweeper) = setup(MIN, 5 * MIN);
        let t0 = Instant::now();
        registry.upsert_at("old", 1.0, t0).unwrap();
        registry.upsert_at("new", 1.0, t0 + 2 * MIN).unwrap();

        assert_eq!(sweeper.sweep_at(t0 + 6 * MIN).unwrap(), 1);
        assert_eq!(registry.get("new"), Some(1.0));
        assert_eq!(registry.get("old"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_evicts_on_schedule_and_stops_on_shutdown() {
        let (registry, _, sweeper) = setup(MIN, 5 * MIN);
        registry.upsert("temp", 21.5).unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run(rx));

        // ticks at 1..=4 min: not stale yet
        tokio::time::sleep(4 * MIN + Duration::from_secs(30)).await;
        assert_eq!(registry.len(), 1);

        // tick at 5 min is exactly at the threshold, tick at 6 min evicts
        tokio::time::sleep(MIN + Duration::from_secs(31)).await;
        assert!(registry.is_empty());

        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_when_sender_dropped() {
        let (_, _, sweeper) = setup(MIN, 5 * MIN);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run(rx));
        drop(tx);
        handle.await.unwrap().unwrap();
    }
}
