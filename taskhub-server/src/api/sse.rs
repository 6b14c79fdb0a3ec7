//! Server-Sent Events stream of task events
//!
//! An alternative to `/ws` for clients that only listen. Without `taskId`
//! the stream carries events addressed to everyone; with it, that task's
//! room events too.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use taskhub_common::events::task_room;
use taskhub_common::Audience;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::realtime::messages::event_data;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub task_id: Option<Uuid>,
}

/// Whether an event addressed to `audience` belongs on a stream watching `room`
fn wanted(audience: &Audience, room: Option<&str>) -> bool {
    match audience {
        Audience::All => true,
        Audience::Room(name) => room == Some(name.as_str()),
    }
}

/// GET /api/events
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let room = query.task_id.map(task_room);
    debug!("New SSE client connected (room: {:?})", room);

    let stream = BroadcastStream::new(state.hub.subscribe()).filter_map(move |result| {
        let room = room.clone();
        async move {
            match result {
                Ok(published) => {
                    if !wanted(&published.audience, room.as_deref()) {
                        return None;
                    }
                    let data = match event_data(&published.event) {
                        Ok(data) => data,
                        Err(e) => {
                            warn!("Failed to serialize event: {}", e);
                            return None;
                        }
                    };
                    Event::default()
                        .event(published.event.name())
                        .json_data(data)
                        .ok()
                        .map(Ok)
                }
                Err(e) => {
                    // Lagged: the missed events are gone, keep streaming
                    warn!("SSE stream error: {:?}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_filter() {
        let room = task_room(Uuid::nil());
        assert!(wanted(&Audience::All, None));
        assert!(!wanted(&Audience::Room(room.clone()), None));
        assert!(wanted(&Audience::Room(room.clone()), Some(room.as_str())));
        assert!(!wanted(&Audience::Room("task:other".into()), Some(room.as_str())));
    }
}
