//! UI Routes - HTML pages for the PlayStack web interface
//!
//! - **Root Page** (`root`): audio → MIDI → score → playback
//! - **Instrumental Page** (`instrumental`): vocal remover
//! - **Static Assets** (`static_assets`): CSS/JS file serving

use crate::api::buildinfo::BuildInfo;
use crate::AppState;
use axum::{routing::get, Router};

mod instrumental;
mod root;
mod static_assets;

use instrumental::instrumental_page;
use root::root_page;
use static_assets::{serve_playstack_css, serve_playstack_js};

/// Page header with title, navigation and build identification
fn page_header(title: &str, subtitle: &str) -> String {
    let build = BuildInfo::current();
    format!(
        r#"<header>
        <div class="header-content">
            <div class="header-left">
                <h1>{title}</h1>
                <div class="subtitle">{subtitle}</div>
                <nav><a href="/">Transcribe</a><a href="/instrumental">Vocal remover</a></nav>
            </div>
            <div class="header-right">
                <div class="build-info-line">playstack v{version}</div>
                <div class="build-info-line">{git_hash} ({profile})</div>
                <div class="build-info-line">{timestamp}</div>
            </div>
        </div>
    </header>"#,
        title = title,
        subtitle = subtitle,
        version = build.version,
        git_hash = build.git_hash,
        profile = build.build_profile,
        timestamp = build.build_timestamp,
    )
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        // Page routes
        .route("/", get(root_page))
        .route("/instrumental", get(instrumental_page))
        // Static assets
        .route("/static/playstack.css", get(serve_playstack_css))
        .route("/static/playstack.js", get(serve_playstack_js))
}
