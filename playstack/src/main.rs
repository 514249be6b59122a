//! playstack - audio → MIDI → score → playback web service
//!
//! Serves the transcription and vocal-remover pages and runs the
//! pipelines on request, shelling out to yt-dlp, basic-pitch, midi2ly,
//! lilypond, fluidsynth and ffmpeg.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playstack::config::{AppConfig, ConfigOverrides};
use playstack::pipeline::SystemCommandRunner;
use playstack::AppState;
use playstack_common::config::{default_config_path, load_or_default, CONFIG_PATH_ENV};
use playstack_common::events::EventBus;

/// Command-line arguments for playstack
#[derive(Parser, Debug)]
#[command(name = "playstack")]
#[command(about = "Audio-to-score transcription and playback service")]
#[command(version)]
struct Args {
    /// Address to listen on (host:port)
    #[arg(short, long, env = "PLAYSTACK_BIND")]
    bind: Option<String>,

    /// TOML config file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// SoundFont used for audio rendering
    #[arg(long, env = "SOUNDFONT_PATH")]
    soundfont: Option<PathBuf>,

    /// Directory under which per-run workspaces are created
    #[arg(long, env = "PLAYSTACK_SCRATCH_ROOT")]
    scratch_root: Option<PathBuf>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "PLAYSTACK_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The TOML file supplies the default log level, so it is read before
    // tracing is up; its location is logged once the subscriber exists.
    let toml_config =
        load_or_default(args.config.as_deref()).context("Failed to load configuration file")?;

    // Initialize tracing
    let level = toml_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "playstack={level},playstack_common={level},tower_http={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting PlayStack v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match args.config.clone().or_else(default_config_path) {
        Some(path) if path.is_file() => info!("Config file: {}", path.display()),
        Some(path) => warn!(
            "Config file not found at {}; using compiled defaults",
            path.display()
        ),
        None => warn!("No config directory available; using compiled defaults"),
    }

    let config = AppConfig::resolve(
        ConfigOverrides {
            bind_address: args.bind,
            soundfont_path: args.soundfont,
            scratch_root: args.scratch_root,
            max_upload_bytes: args.max_upload_bytes,
        },
        &toml_config,
    );

    info!("Scratch root: {}", config.scratch_root.display());
    if config.soundfont_path.is_file() {
        info!("SoundFont: {}", config.soundfont_path.display());
    } else {
        warn!(
            "SoundFont not found at {}; audio rendering will be skipped",
            config.soundfont_path.display()
        );
    }

    tokio::fs::create_dir_all(&config.scratch_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create scratch root {}",
                config.scratch_root.display()
            )
        })?;

    let bind_address = config.bind_address.clone();
    let event_bus = EventBus::new(100);
    let state = AppState::new(config, Arc::new(SystemCommandRunner), event_bus);
    let app = playstack::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
