//! HTTP API handlers for PlayStack
//!
//! HTML pages, the two pipeline endpoints, SSE progress stream, health and
//! build information.

pub mod buildinfo;
pub mod health;
pub mod runs;
pub mod sse;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use runs::run_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
