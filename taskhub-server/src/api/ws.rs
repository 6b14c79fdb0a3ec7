//! WebSocket endpoint for room-based real-time updates

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::realtime::{messages, RoomHub};
use crate::AppState;

/// GET /ws
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// Drive one connection until either side goes away
async fn handle_socket(socket: WebSocket, hub: RoomHub) {
    let conn_id = Uuid::new_v4();
    hub.connect(conn_id);
    info!(
        "WebSocket client {} connected, total: {}",
        conn_id,
        hub.connection_count()
    );

    let mut events = hub.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = messages::handle_client_text(&hub, conn_id, &text) {
                        if sender.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("WebSocket {} receive error: {}", conn_id, e);
                    break;
                }
            },
            published = events.recv() => match published {
                Ok(published) => {
                    if !hub.delivers_to(conn_id, &published.audience) {
                        continue;
                    }
                    match messages::event_frame(&published.event) {
                        Ok(frame) => {
                            if sender.send(Message::Text(frame)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to serialize {}: {}", published.event.name(), e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket {} lagged, skipped {} events", conn_id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    hub.disconnect(conn_id);
    info!("WebSocket client {} disconnected", conn_id);
}
