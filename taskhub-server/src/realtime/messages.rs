//! WebSocket wire frames
//!
//! Client → server: `{"action":"join-task","taskId":"…"}` and
//! `{"action":"leave-task","taskId":"…"}`.
//!
//! Server → client: `{"event":"<name>","data":…}`; a malformed client
//! frame gets `{"event":"error","data":{"message":"…"}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskhub_common::events::task_room;
use taskhub_common::TaskEvent;
use uuid::Uuid;

use super::RoomHub;

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinTask {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    LeaveTask {
        #[serde(rename = "taskId")]
        task_id: String,
    },
}

impl ClientMessage {
    pub fn room(&self) -> String {
        match self {
            ClientMessage::JoinTask { task_id } | ClientMessage::LeaveTask { task_id } => {
                task_room(task_id)
            }
        }
    }

    /// Apply the membership change to the hub
    pub fn apply(&self, hub: &RoomHub, conn_id: Uuid) {
        let room = self.room();
        match self {
            ClientMessage::JoinTask { .. } => hub.join(&room, conn_id),
            ClientMessage::LeaveTask { .. } => hub.leave(&room, conn_id),
        }
    }
}

/// Error frame payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,
}

#[derive(Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ErrorFrame<'a> {
    Error(&'a ServerError),
}

/// Parse a text frame from a client
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ServerError> {
    serde_json::from_str(text).map_err(|e| ServerError {
        message: format!("Invalid message: {}", e),
    })
}

/// Handle one text frame; returns the error frame to send back, if any
pub fn handle_client_text(hub: &RoomHub, conn_id: Uuid, text: &str) -> Option<String> {
    match parse_client_message(text) {
        Ok(msg) => {
            msg.apply(hub, conn_id);
            None
        }
        Err(err) => Some(error_frame(&err)),
    }
}

/// Serialize an event as `{"event":…,"data":…}`
pub fn event_frame(event: &TaskEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn error_frame(err: &ServerError) -> String {
    serde_json::to_string(&ErrorFrame::Error(err))
        .unwrap_or_else(|_| r#"{"event":"error","data":{"message":"Invalid message"}}"#.to_string())
}

/// The `data` part of an event, used as the SSE payload
pub fn event_data(event: &TaskEvent) -> serde_json::Result<Value> {
    let mut frame = serde_json::to_value(event)?;
    Ok(frame
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join_and_leave() {
        let join = parse_client_message(r#"{"action":"join-task","taskId":"abc"}"#).unwrap();
        assert_eq!(join, ClientMessage::JoinTask { task_id: "abc".into() });
        assert_eq!(join.room(), "task:abc");

        let leave = parse_client_message(r#"{"action":"leave-task","taskId":"abc"}"#).unwrap();
        assert!(matches!(leave, ClientMessage::LeaveTask { .. }));
    }

    #[test]
    fn test_malformed_frames_produce_error_frame() {
        let hub = RoomHub::new(4);
        let conn = Uuid::new_v4();

        for text in ["not json", r#"{"action":"dance"}"#, r#"{"action":"join-task"}"#] {
            let reply = handle_client_text(&hub, conn, text).unwrap();
            let frame: Value = serde_json::from_str(&reply).unwrap();
            assert_eq!(frame["event"], "error");
            assert!(frame["data"]["message"].as_str().unwrap().starts_with("Invalid message"));
        }
        assert_eq!(hub.connection_count(), 0);
    }

    #[test]
    fn test_join_then_leave_through_text_frames() {
        let hub = RoomHub::new(4);
        let conn = Uuid::new_v4();

        assert!(handle_client_text(&hub, conn, r#"{"action":"join-task","taskId":"t1"}"#).is_none());
        assert!(hub.is_member("task:t1", conn));

        assert!(handle_client_text(&hub, conn, r#"{"action":"leave-task","taskId":"t1"}"#).is_none());
        assert!(!hub.is_member("task:t1", conn));
    }

    #[test]
    fn test_event_frame_and_data() {
        let id = Uuid::nil();
        let event = TaskEvent::TaskDeleted(id);

        let frame: Value = serde_json::from_str(&event_frame(&event).unwrap()).unwrap();
        assert_eq!(frame, json!({"event": "task-deleted", "data": id.to_string()}));
        assert_eq!(event_data(&event).unwrap(), json!(id.to_string()));
    }
}
