//! Shared API request/response types
//!
//! Request bodies are validated here, independent of the HTTP framework.
//! The server wraps [`Validate`] in an extractor; clients reuse the same
//! types to build requests and decode responses.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Comment, FileAttachment, TaskDetail, TaskPriority, TaskStatus, User, Video,
};
use crate::{time, Error, Result};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("static regex")
});

/// Schema check run on every request body before it reaches the store
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn require_email(email: &str) -> Result<()> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(Error::InvalidInput("Invalid email address".to_string()))
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::InvalidInput(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

/// Due date semantics shared by create and update: empty string means "none"
fn parse_optional_due_date(raw: &str) -> Result<Option<DateTime<Utc>>> {
    if raw.is_empty() {
        Ok(None)
    } else {
        time::parse_due_date(raw).map(Some)
    }
}

// ========================================
// Auth
// ========================================

/// POST /api/auth/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RegisterRequest {
    /// Display name, falling back to the local part of the email
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.email.split('@').next().unwrap_or_default().to_string(),
        }
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<()> {
        require_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// POST /api/auth/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        require_email(&self.email)
    }
}

// ========================================
// Tasks
// ========================================

/// POST /api/tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<String>,
    pub author_id: Uuid,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<()> {
        require_non_empty("title", &self.title)?;
        if let Some(raw) = &self.due_date {
            parse_optional_due_date(raw)?;
        }
        Ok(())
    }
}

impl CreateTaskRequest {
    /// Resolved due date (absent or empty means none)
    pub fn due_date(&self) -> Result<Option<DateTime<Utc>>> {
        match &self.due_date {
            Some(raw) => parse_optional_due_date(raw),
            None => Ok(None),
        }
    }
}

/// PUT /api/tasks/:id
///
/// Every field is optional; only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require_non_empty("title", title)?;
        }
        if let Some(raw) = &self.due_date {
            parse_optional_due_date(raw)?;
        }
        Ok(())
    }
}

impl UpdateTaskRequest {
    /// Due date change: `None` leaves it alone, `Some(None)` clears it
    pub fn due_date_change(&self) -> Result<Option<Option<DateTime<Utc>>>> {
        self.due_date
            .as_deref()
            .map(parse_optional_due_date)
            .transpose()
    }
}

// ========================================
// Comments / videos
// ========================================

/// POST /api/tasks/:id/comments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub author_id: Uuid,
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<()> {
        require_non_empty("content", &self.content)
    }
}

/// POST /api/tasks/:id/videos
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub title: String,
    pub youtube_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for CreateVideoRequest {
    fn validate(&self) -> Result<()> {
        require_non_empty("title", &self.title)?;
        if !URL_PATTERN.is_match(&self.youtube_url) {
            return Err(Error::InvalidInput("youtubeUrl must be a valid URL".to_string()));
        }
        Ok(())
    }
}

/// DELETE /api/tasks/:id/videos?videoId=...
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    #[serde(default)]
    pub video_id: Option<String>,
}

// ========================================
// Responses
// ========================================

/// Bare acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskDetail>,
}

/// Single task; `message` is present on mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub task: TaskDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub message: String,
    pub comment: Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResponse {
    pub message: String,
    pub file: FileAttachment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<FileAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub message: String,
    pub video: Video,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListResponse {
    pub videos: Vec<Video>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register(email: &str, password: &str, name: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register("ana@example.com", "secret", None).validate().is_ok());
        assert!(register("ana@example", "secret", None).validate().is_err());
        assert!(register("ana@example.com", "short", None).validate().is_err());
    }

    #[test]
    fn test_register_display_name_defaults_to_local_part() {
        assert_eq!(register("ana@example.com", "secret", None).display_name(), "ana");
        assert_eq!(register("ana@example.com", "secret", Some("")).display_name(), "ana");
        assert_eq!(register("ana@example.com", "secret", Some("Ana B")).display_name(), "Ana B");
    }

    #[test]
    fn test_create_task_parses_camel_case_body() {
        let author = Uuid::new_v4();
        let req: CreateTaskRequest = serde_json::from_value(json!({
            "title": "Ship it",
            "priority": "URGENT",
            "dueDate": "2025-01-31",
            "authorId": author,
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.priority, Some(TaskPriority::Urgent));
        assert_eq!(req.status, None);
        assert!(req.due_date().unwrap().is_some());
    }

    #[test]
    fn test_create_task_rejects_unknown_status() {
        let result = serde_json::from_value::<CreateTaskRequest>(json!({
            "title": "x",
            "status": "DONE",
            "authorId": Uuid::new_v4(),
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_task_requires_title() {
        let req: CreateTaskRequest = serde_json::from_value(json!({
            "title": "",
            "authorId": Uuid::new_v4(),
        }))
        .unwrap();
        assert!(matches!(req.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_update_due_date_change() {
        let untouched = UpdateTaskRequest::default();
        assert_eq!(untouched.due_date_change().unwrap(), None);

        let cleared = UpdateTaskRequest {
            due_date: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(cleared.due_date_change().unwrap(), Some(None));

        let bad = UpdateTaskRequest {
            due_date: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_update_rejects_empty_title() {
        let req = UpdateTaskRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_video_url_validation() {
        let mut req = CreateVideoRequest {
            title: "Talk".to_string(),
            youtube_url: "https://youtu.be/abc".to_string(),
            description: None,
        };
        assert!(req.validate().is_ok());

        req.youtube_url = "youtu.be/abc".to_string();
        assert!(req.validate().is_err());
    }
}
