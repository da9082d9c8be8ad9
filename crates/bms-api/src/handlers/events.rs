//! Change notifications over Server-Sent Events

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

/// GET /api/v1/events
/// Stream store changes; the SSE event type is the change name
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.store().subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(change) => Some(Ok::<_, Infallible>(
            Event::default()
                .event(change.name())
                .data(serde_json::to_string(&change).unwrap_or_default()),
        )),
        Err(e) => {
            // Lagged receivers skip what they missed
            tracing::debug!(error = %e, "Event stream lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
