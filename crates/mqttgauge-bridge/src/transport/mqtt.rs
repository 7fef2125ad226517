//! MQTT session loop.
//!
//! Responsibilities:
//! - Build client options from `MqttSection`
//! - Subscribe on every ConnAck (the broker forgets non-persistent sessions)
//! - Forward publish payloads to the bounded ingest queue
//! - Log connection loss, back off, and let the next poll reconnect
//!
//! Nothing here touches the registry; the ingest worker owns that.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use mqttgauge_core::error::{MqttGaugeError, Result};

use crate::app_state::AppState;
use crate::config::MqttSection;

const DEFAULT_PORT: u16 = 1883;
const CLIENT_CHANNEL_CAPACITY: usize = 64;
const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// Broker host and port parsed from `mqtt.url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddr {
    pub host: String,
    pub port: u16,
}

/// Parse `tcp://host:port`, `mqtt://host:port` or a bare `host[:port]`.
pub fn parse_broker_url(url: &str) -> Result<BrokerAddr> {
    let rest = match url.split_once("://") {
        Some(("tcp" | "mqtt", rest)) => rest,
        Some((scheme, _)) => {
            return Err(MqttGaugeError::Config(format!("unsupported broker scheme '{scheme}'")));
        }
        None => url,
    };
    let rest = rest.trim_end_matches('/');

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| MqttGaugeError::Config(format!("invalid broker port '{port}': {e}")))?;
            (host, port)
        }
        None => (rest, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(MqttGaugeError::Config(format!("broker url '{url}' has no host")));
    }
    Ok(BrokerAddr {
        host: host.to_string(),
        port,
    })
}

pub fn mqtt_options(cfg: &MqttSection) -> Result<MqttOptions> {
    let addr = parse_broker_url(&cfg.url)?;
    let mut opts = MqttOptions::new(cfg.client_id.clone(), addr.host, addr.port);
    opts.set_keep_alive(cfg.keep_alive());
    Ok(opts)
}

/// Run the MQTT session until `shutdown` fires.
///
/// Returns an error only if the ingest queue is gone or the client cannot
/// queue a subscribe request; connection failures are retried forever.
pub async fn run(
    cfg: MqttSection,
    state: AppState,
    queue: mpsc::Sender<Bytes>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let opts = mqtt_options(&cfg)?;
    let (client, mut eventloop) = AsyncClient::new(opts, CLIENT_CHANNEL_CAPACITY);

    info!(url = %cfg.url, client_id = %cfg.client_id, "connecting to broker");

    loop {
        tokio::select! {
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(url = %cfg.url, "connected");
                    state.set_connected(true);

                    info!(topic = %cfg.topic, "subscribing");
                    client
                        .try_subscribe(cfg.topic.clone(), QoS::AtMostOnce)
                        .map_err(|e| MqttGaugeError::Transport(format!("subscribe failed: {e}")))?;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    // a full queue must not hold shutdown hostage
                    match until_shutdown(queue.send(publish.payload), &mut shutdown).await {
                        Some(Ok(())) => {}
                        Some(Err(_)) => return Err(MqttGaugeError::Internal("ingest queue closed".into())),
                        None => return close(&client, &mut eventloop, &state).await,
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    if state.is_connected() {
                        warn!(error = %e, "connection lost");
                    } else {
                        warn!(error = %e, url = %cfg.url, "connect failed");
                    }
                    state.set_connected(false);
                    if until_shutdown(tokio::time::sleep(cfg.reconnect_delay()), &mut shutdown).await.is_none() {
                        return close(&client, &mut eventloop, &state).await;
                    }
                    info!(url = %cfg.url, "reconnecting");
                }
            },

            _ = shutdown.changed() => return close(&client, &mut eventloop, &state).await,
        }
    }
}

/// Drive `fut` to completion unless shutdown fires first (`None`).
///
/// A dropped shutdown sender counts as shutdown.
pub async fn until_shutdown<F: Future>(fut: F, shutdown: &mut watch::Receiver<bool>) -> Option<F::Output> {
    if *shutdown.borrow() {
        return None;
    }
    tokio::select! {
        out = fut => Some(out),
        _ = shutdown.changed() => None,
    }
}

async fn close(client: &AsyncClient, eventloop: &mut EventLoop, state: &AppState) -> Result<()> {
    let _ = client.try_disconnect();
    // give the event loop a moment to flush DISCONNECT
    let _ = tokio::time::timeout(DISCONNECT_GRACE, eventloop.poll()).await;
    state.set_connected(false);
    info!("mqtt session closed");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addr(host: &str, port: u16) -> BrokerAddr {
        BrokerAddr {
            host: host.into(),
            port,
        }
    }

    #[test]
    fn parses_broker_urls() {
        assert_eq!(parse_broker_url("tcp://broker:1884").unwrap(), addr("broker", 1884));
        assert_eq!(parse_broker_url("mqtt://10.0.0.5").unwrap(), addr("10.0.0.5", 1883));
        assert_eq!(parse_broker_url("localhost:1883/").unwrap(), addr("localhost", 1883));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_cut_short_by_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        let started = tokio::time::Instant::now();

        let waiter = tokio::spawn(async move {
            until_shutdown(tokio::time::sleep(Duration::from_secs(300)), &mut rx).await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(true).unwrap();

        assert!(waiter.await.unwrap().is_none());
        assert!(started.elapsed() < Duration::from_secs(300));
    }

    #[tokio::test]
    async fn full_queue_send_gives_way_to_shutdown() {
        let (queue, _held) = mpsc::channel::<Bytes>(1);
        queue.send(Bytes::from_static(b"a:1")).await.unwrap();

        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        let sent = until_shutdown(queue.send(Bytes::from_static(b"b:2")), &mut rx).await;
        assert!(sent.is_none());
    }

    #[tokio::test]
    async fn completes_when_no_shutdown() {
        let (_tx, mut rx) = watch::channel(false);
        assert_eq!(until_shutdown(async { 7 }, &mut rx).await, Some(7));
    }

    #[test]
    fn rejects_bad_broker_urls() {
        for url in ["ws://broker:80", "tcp://:1883", "tcp://broker:port", ""] {
            let err = parse_broker_url(url).unwrap_err();
            assert_eq!(err.code().as_str(), "CONFIG", "{url}");
        }
    }
}
