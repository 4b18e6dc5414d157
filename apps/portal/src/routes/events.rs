use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::state::AppState;
use crate::sync::{PortalEvent, Subscription};

/// Turns a subscription into a stream that ends when the channel closes.
/// Dropping the stream drops the subscription.
fn portal_events(mut subscription: Subscription) -> impl Stream<Item = PortalEvent> {
    stream! {
        while let Some(event) = subscription.recv().await {
            yield event;
        }
    }
}

fn to_sse(event: &PortalEvent) -> Event {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.wire_name()).data(json)
}

/// GET /api/v1/events
///
/// Server-sent change notifications. Clients reload the cart or the
/// session when one arrives.
pub async fn handle_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = portal_events(state.sync.subscribe()).map(|event| Ok(to_sse(&event)));
    Sse::new(events).keep_alive(KeepAlive::default())
}
