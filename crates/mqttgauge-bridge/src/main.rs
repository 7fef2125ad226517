//! mqttgauge bridge
//!
//! - Subscribe to an MQTT topic carrying `name:value` payloads
//! - Export each name as a Prometheus gauge over HTTP
//! - Retire gauges that stop receiving updates

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tracing_subscriber::{fmt, EnvFilter};

use mqttgauge_bridge::{app_state::AppState, config, ingest, lifecycle, router, sweeper::Sweeper, transport};
use mqttgauge_core::error::{MqttGaugeError, Result};

const DEFAULT_CONFIG_PATH: &str = "mqttgauge.yaml";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .http
        .listen
        .parse()
        .map_err(|e| MqttGaugeError::Config(format!("http.listen: {e}")))?;

    let state = AppState::new(cfg.clone())?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ---- ingest: mqtt loop -> bounded queue -> worker -> registry
    let (queue_tx, queue_rx) = mpsc::channel::<Bytes>(cfg.mqtt.queue_capacity);
    let worker = ingest::spawn_worker(state.registry(), state.metrics(), queue_rx);
    let mut mqtt = tokio::spawn(transport::mqtt::run(
        cfg.mqtt.clone(),
        state.clone(),
        queue_tx,
        shutdown_rx.clone(),
    ));

    // ---- sweeper
    let sweeper = Sweeper::from_config(state.registry(), state.metrics(), &cfg.sweeper);
    let mut sweeper = tokio::spawn(sweeper.run(shutdown_rx.clone()));

    // ---- http
    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MqttGaugeError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, config = %path, "mqttgauge-bridge starting");

    let mut server_shutdown = shutdown_rx.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
            .map_err(|e| MqttGaugeError::Internal(format!("http server failed: {e}")))
    });

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
        res = &mut sweeper => joined("sweeper", res),
        res = &mut mqtt => joined("mqtt", res),
        res = &mut server => joined("http", res),
    };

    let _ = shutdown_tx.send(true);
    lifecycle::join_within(
        SHUTDOWN_GRACE,
        vec![("mqtt", mqtt), ("http", server), ("sweeper", sweeper)],
    )
    .await;
    // the mqtt task owned the only queue sender; with it gone the worker drains and exits
    lifecycle::join_within(SHUTDOWN_GRACE, vec![("ingest", worker)]).await;

    if let Err(e) = &outcome {
        tracing::error!(error = %e, "mqttgauge-bridge stopping on error");
    }
    outcome
}

fn joined(task: &str, res: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    match res {
        Ok(Ok(())) => Err(MqttGaugeError::Internal(format!("{task} task exited"))),
        Ok(Err(e)) => Err(e),
        Err(e) => Err(MqttGaugeError::Internal(format!("{task} task panicked: {e}"))),
    }
}
