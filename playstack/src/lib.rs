//! PlayStack library interface
//!
//! Exposes the pipeline, configuration and router for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;

pub use crate::error::{ApiError, ApiResult};

use crate::config::AppConfig;
use crate::pipeline::{CommandRunner, PipelineContext, RunReport};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use playstack_common::events::EventBus;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration, read-only after startup
    pub config: Arc<AppConfig>,
    /// Executes the external tools
    pub runner: Arc<dyn CommandRunner>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Held for the whole duration of a run
    pub run_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last fatal run error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: AppConfig, runner: Arc<dyn CommandRunner>, event_bus: EventBus) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            event_bus,
            run_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn pipeline(&self) -> PipelineContext {
        PipelineContext::new(self.config.clone(), self.runner.clone(), self.event_bus.clone())
    }

    /// Run a pipeline under the run lock
    ///
    /// Fails with `Conflict` when another run holds the lock. The run itself
    /// executes on a spawned task that owns the lock guard, so it finishes
    /// (and releases the lock) even if the requesting client goes away.
    pub async fn execute_run<F, Fut>(&self, run: F) -> ApiResult<RunReport>
    where
        F: FnOnce(PipelineContext) -> Fut,
        Fut: Future<Output = RunReport> + Send + 'static,
    {
        let guard = self.run_lock.clone().try_lock_owned().map_err(|_| {
            tracing::warn!("Run rejected: another run is in progress");
            ApiError::Conflict("A run is already in progress".to_string())
        })?;

        let future = run(self.pipeline());
        let report = tokio::spawn(async move {
            let report = future.await;
            drop(guard);
            report
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Run task failed: {}", e)))?;

        if let Some(error) = &report.error {
            *self.last_error.write().await = Some(error.clone());
        }
        Ok(report)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::run_routes())
        .route("/events", get(api::event_stream))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
