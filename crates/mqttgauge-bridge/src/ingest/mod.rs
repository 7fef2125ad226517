//! Ingest path: raw MQTT payload -> registry upsert.
//!
//! Parsing and validation happen before the registry is touched; the upsert
//! is the only step that takes the registry lock. Rejected payloads are
//! logged and counted, never propagated as faults.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use mqttgauge_core::error::Result;
use mqttgauge_core::message::parse_update;

use crate::obs::metrics::{BridgeMetrics, OUTCOME_ACCEPTED};
use crate::registry::{MetricRegistry, UpsertOutcome};

/// Apply one payload to the registry.
pub fn apply(registry: &MetricRegistry, metrics: &BridgeMetrics, payload: &[u8]) -> Result<UpsertOutcome> {
    let result = parse_update(payload).and_then(|update| {
        let outcome = registry.upsert(&update.name, update.value)?;
        debug!(name = %update.name, value = update.value, "gauge set");
        Ok(outcome)
    });

    match &result {
        Ok(outcome) => {
            metrics.observe_message(OUTCOME_ACCEPTED);
            match outcome {
                UpsertOutcome::Created => metrics.gauges_created.inc(),
                UpsertOutcome::Adopted => metrics.gauges_adopted.inc(),
                UpsertOutcome::Updated => {}
            }
        }
        Err(e) => {
            let code = e.code().as_str();
            metrics.observe_message(code);
            let payload = String::from_utf8_lossy(payload);
            if e.is_input_error() {
                warn!(payload = %payload, code, error = %e, "rejected message");
            } else {
                error!(payload = %payload, code, error = %e, "message could not be applied");
            }
        }
    }
    result
}

/// Drain `rx` until every sender is gone, applying each payload.
pub fn spawn_worker(
    registry: Arc<MetricRegistry>,
    metrics: Arc<BridgeMetrics>,
    mut rx: mpsc::Receiver<Bytes>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            // rejections are already logged and counted
            let _ = apply(&registry, &metrics, &payload);
        }
        info!("ingest worker stopped");
    })
}
