//! Health check endpoint
//!
//! Reports uptime, the last fatal run error, which external tools can be
//! started, and whether the configured SoundFont exists.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when every tool and the SoundFont are present, else "degraded"
    pub status: String,
    /// Module name ("playstack")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Last fatal run error if any (for diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Tool label → can be started
    pub tools: BTreeMap<String, bool>,
    pub soundfont_path: String,
    pub soundfont_present: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    let probes = state.config.tools.probes();
    let checks = probes
        .iter()
        .map(|(_, program, probe_arg)| state.runner.is_available(program, probe_arg));
    let tools: BTreeMap<String, bool> = probes
        .iter()
        .map(|(label, _, _)| label.to_string())
        .zip(join_all(checks).await)
        .collect();

    let soundfont_present = state.config.soundfont_path.is_file();
    let healthy = soundfont_present && tools.values().all(|available| *available);

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        module: "playstack".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        last_error,
        tools,
        soundfont_path: state.config.soundfont_path.display().to_string(),
        soundfont_present,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
