//! Server-Sent Events (SSE) for live run progress

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of run events
///
/// Streams RunStarted, StageMessage, RunCompleted and RunFailed so the
/// pages can show progress while a request is still pending.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    playstack_common::sse::create_event_sse_stream("playstack", state.event_bus.subscribe())
}
