//! Static asset handlers for the PlayStack UI
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const PLAYSTACK_CSS: &str = include_str!("../../../static/playstack.css");
const PLAYSTACK_JS: &str = include_str!("../../../static/playstack.js");

/// GET /static/playstack.css
pub async fn serve_playstack_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        PLAYSTACK_CSS,
    )
        .into_response()
}

/// GET /static/playstack.js
///
/// Shared page logic: SSE progress, run submission, result rendering
pub async fn serve_playstack_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        PLAYSTACK_JS,
    )
        .into_response()
}
