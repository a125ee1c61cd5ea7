//! Server-Sent Events (SSE) rendering for article sessions
//!
//! Events are sent as unnamed `data:` frames carrying the event JSON, so a
//! browser `EventSource.onmessage` handler receives every one of them and
//! dispatches on the `type` field.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{info, warn};

use crate::events::{ArticleEvent, ArticleSubscription};

/// Keep-alive comment interval
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Render an event as an SSE frame
pub fn to_sse_event(event: &ArticleEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Stream an article session to the client
///
/// The subscription moves into the stream, so the session unregisters when
/// the client disconnects and axum drops the response body.
pub fn article_event_stream(
    mut subscription: ArticleSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        article_id = %subscription.article_id(),
        client_id = %subscription.client_id(),
        "SSE client connected to article stream"
    );

    let stream = async_stream::stream! {
        let connected = ArticleEvent::Connected {
            client_id: subscription.client_id().to_string(),
        };
        if let Some(event) = to_sse_event(&connected) {
            yield Ok(event);
        }

        while let Some(event) = subscription.recv().await {
            if let Some(frame) = to_sse_event(&event) {
                yield Ok(frame);
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
