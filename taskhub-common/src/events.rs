//! Real-time event types
//!
//! Events are fanned out to WebSocket and SSE clients. Each event carries
//! its wire name (`task-created`, `comment-added`, ...) as the `event` tag
//! and the affected record as `data`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Comment, FileAttachment, TaskDetail, Video};

/// Prefix of every per-task room name
pub const TASK_ROOM_PREFIX: &str = "task:";

/// Room name for a task (`task:<id>`)
pub fn task_room(task_id: impl fmt::Display) -> String {
    format!("{}{}", TASK_ROOM_PREFIX, task_id)
}

/// Who receives a published event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    /// Every connected client
    All,
    /// Only clients that joined the named room
    Room(String),
}

impl Audience {
    pub fn task(task_id: Uuid) -> Self {
        Audience::Room(task_room(task_id))
    }
}

/// Task mutation events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum TaskEvent {
    /// New task created (broadcast to everyone)
    TaskCreated(TaskDetail),

    /// Task fields changed (task room only)
    TaskUpdated(TaskDetail),

    /// Task removed (broadcast to everyone, payload is the task id)
    TaskDeleted(Uuid),

    /// Comment posted on a task
    CommentAdded(Comment),

    /// File attached to a task
    FileUploaded(FileAttachment),

    /// YouTube video linked to a task
    VideoAdded(Video),
}

impl TaskEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated(_) => "task-created",
            TaskEvent::TaskUpdated(_) => "task-updated",
            TaskEvent::TaskDeleted(_) => "task-deleted",
            TaskEvent::CommentAdded(_) => "comment-added",
            TaskEvent::FileUploaded(_) => "file-uploaded",
            TaskEvent::VideoAdded(_) => "video-added",
        }
    }

    /// Task the event concerns
    pub fn task_id(&self) -> Uuid {
        match self {
            TaskEvent::TaskCreated(detail) | TaskEvent::TaskUpdated(detail) => detail.id(),
            TaskEvent::TaskDeleted(id) => *id,
            TaskEvent::CommentAdded(comment) => comment.task_id,
            TaskEvent::FileUploaded(file) => file.task_id,
            TaskEvent::VideoAdded(video) => video.task_id,
        }
    }

    /// Default audience: creation and deletion go to everyone, the rest to
    /// the task's room.
    pub fn audience(&self) -> Audience {
        match self {
            TaskEvent::TaskCreated(_) | TaskEvent::TaskDeleted(_) => Audience::All,
            _ => Audience::task(self.task_id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn video(task_id: Uuid) -> Video {
        Video {
            id: Uuid::new_v4(),
            title: "Demo".to_string(),
            youtube_url: "https://youtu.be/abc123".to_string(),
            youtube_id: "abc123".to_string(),
            description: None,
            task_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_room_name() {
        let id = Uuid::nil();
        assert_eq!(task_room(id), "task:00000000-0000-0000-0000-000000000000");
        assert_eq!(Audience::task(id), Audience::Room(task_room(id)));
    }

    #[test]
    fn test_deleted_event_wire_format() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(TaskEvent::TaskDeleted(id)).unwrap();
        assert_eq!(value, json!({ "event": "task-deleted", "data": id.to_string() }));
    }

    #[test]
    fn test_room_scoped_events_target_task_room() {
        let task_id = Uuid::new_v4();
        let event = TaskEvent::VideoAdded(video(task_id));
        assert_eq!(event.name(), "video-added");
        assert_eq!(event.audience(), Audience::Room(task_room(task_id)));
        assert_eq!(TaskEvent::TaskDeleted(task_id).audience(), Audience::All);
    }

    #[test]
    fn test_event_name_matches_serde_tag() {
        let event = TaskEvent::VideoAdded(video(Uuid::new_v4()));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], event.name());
        assert_eq!(value["data"]["youtubeId"], "abc123");
    }
}
