#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use mqttgauge_bridge::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
mqtt:
  url: "tcp://localhost:1883"
  topic: "sensors/#"
sweeper:
  interval_sec: 60 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
mqtt:
  url: "tcp://localhost:1883"
  topic: "sensors/#"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.mqtt.client_id, "mqtt-scraper");
    assert_eq!(cfg.mqtt.queue_capacity, 1024);
    assert_eq!(cfg.http.listen, "0.0.0.0:8080");
    assert_eq!(cfg.sweeper.interval_secs, 60);
    assert_eq!(cfg.sweeper.stale_after_secs, 120);
}

#[test]
fn wrong_version() {
    let bad = r#"
version: 2
mqtt:
  url: "tcp://localhost:1883"
  topic: "sensors/#"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn threshold_not_above_interval() {
    let bad = r#"
version: 1
mqtt:
  url: "tcp://localhost:1883"
  topic: "sensors/#"
sweeper:
  interval_secs: 300
  stale_after_secs: 300
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("stale_after_secs"));
}

#[test]
fn missing_topic_and_bad_url() {
    let no_topic = r#"
version: 1
mqtt:
  url: "tcp://localhost:1883"
  topic: ""
"#;
    assert!(config::load_from_str(no_topic).is_err());

    let bad_url = r#"
version: 1
mqtt:
  url: "ws://localhost:1883"
  topic: "sensors/#"
"#;
    assert!(config::load_from_str(bad_url).is_err());
}

#[test]
fn missing_file() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}
