use std::time::Duration;

use serde::Deserialize;
use mqttgauge_core::error::{MqttGaugeError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    pub mqtt: MqttSection,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub sweeper: SweeperSection,
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MqttGaugeError::UnsupportedVersion);
        }

        self.mqtt.validate()?;
        self.http.validate()?;
        self.sweeper.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttSection {
    /// Broker address, `tcp://host:port` or `mqtt://host:port`.
    pub url: String,

    pub topic: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Capacity of the payload queue between the MQTT loop and the ingest worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl MqttSection {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(MqttGaugeError::Config("mqtt.url must not be empty".into()));
        }
        crate::transport::mqtt::parse_broker_url(&self.url)?;
        if self.topic.trim().is_empty() {
            return Err(MqttGaugeError::Config("mqtt.topic must not be empty".into()));
        }
        if self.client_id.is_empty() {
            return Err(MqttGaugeError::Config("mqtt.client_id must not be empty".into()));
        }
        if !(5..=600).contains(&self.keep_alive_secs) {
            return Err(MqttGaugeError::Config(
                "mqtt.keep_alive_secs must be between 5 and 600".into(),
            ));
        }
        if !(100..=300_000).contains(&self.reconnect_delay_ms) {
            return Err(MqttGaugeError::Config(
                "mqtt.reconnect_delay_ms must be between 100 and 300000".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(MqttGaugeError::Config("mqtt.queue_capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<std::net::SocketAddr>()
            .map_err(|e| MqttGaugeError::Config(format!("http.listen must be a socket address: {e}")))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweeperSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for SweeperSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl SweeperSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.interval_secs) {
            return Err(MqttGaugeError::Config(
                "sweeper.interval_secs must be between 1 and 3600".into(),
            ));
        }
        // Entries refreshed between two sweeps must never look stale.
        if self.stale_after_secs <= self.interval_secs {
            return Err(MqttGaugeError::Config(
                "sweeper.stale_after_secs must be greater than interval_secs".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

fn default_client_id() -> String {
    "mqtt-scraper".into()
}
fn default_keep_alive_secs() -> u64 {
    30
}
fn default_reconnect_delay_ms() -> u64 {
    5000
}
fn default_queue_capacity() -> usize {
    1024
}
fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_interval_secs() -> u64 {
    60
}
fn default_stale_after_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweeper(interval_secs: u64, stale_after_secs: u64) -> SweeperSection {
        SweeperSection { interval_secs, stale_after_secs }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(SweeperSection::default().validate().is_ok());
        assert!(HttpSection::default().validate().is_ok());
    }

    #[test]
    fn threshold_must_exceed_interval() {
        assert!(sweeper(60, 60).validate().is_err());
        assert!(sweeper(300, 120).validate().is_err());
        assert!(sweeper(60, 61).validate().is_ok());
    }

    #[test]
    fn bad_listen_address() {
        let http = HttpSection { listen: "localhost".into() };
        assert_eq!(http.validate().unwrap_err().code().as_str(), "CONFIG");
    }
}
