use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/panel/events — SSE stream of host → webview messages.
///
/// Each event is named `message` and carries one serialised `HostMessage`.
/// Lagged receivers skip the messages they missed.
pub async fn panel_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.web.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        msg.ok()
            .map(|json| Ok::<Event, Infallible>(Event::default().event("message").data(json)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
