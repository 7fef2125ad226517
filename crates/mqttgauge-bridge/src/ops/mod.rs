//! Operational HTTP endpoints.
//!
//! - `/`, `/metrics`   : bridged gauges, Prometheus text format
//! - `/metrics/bridge` : the bridge's own counters
//! - `/v1/gauges`      : JSON snapshot of the registry
//! - `/healthz`        : liveness
//! - `/readyz`         : readiness (503 while the MQTT session is down)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use mqttgauge_core::error::Result;

use crate::app_state::AppState;

const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_connected() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "mqtt disconnected")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    text_response(state.exporter().render())
}

pub async fn bridge_metrics(State(state): State<AppState>) -> Response {
    text_response(state.metrics().render())
}

fn text_response(body: Result<String>) -> Response {
    match body {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.code().as_str()).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GaugeView {
    pub name: String,
    pub value: f64,
    pub age_secs: f64,
}

pub async fn gauges(State(state): State<AppState>) -> Json<Vec<GaugeView>> {
    let views = state
        .registry()
        .snapshot()
        .into_iter()
        .map(|s| GaugeView {
            name: s.name,
            value: s.value,
            age_secs: s.age.as_secs_f64(),
        })
        .collect();
    Json(views)
}
