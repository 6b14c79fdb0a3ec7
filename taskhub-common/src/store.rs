//! Client-side task store
//!
//! Keeps the task list and the currently selected task the way a UI does,
//! and folds real-time [`TaskEvent`]s into that state. Every mutation
//! keeps the selected task consistent with its list entry.

use uuid::Uuid;

use crate::api::types::UpdateTaskRequest;
use crate::events::TaskEvent;
use crate::models::{Comment, FileAttachment, TaskDetail, Video};

/// Fields of a task that a remote update may replace
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<crate::TaskStatus>,
    pub priority: Option<crate::TaskPriority>,
    pub due_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TaskUpdate {
    fn merge_into(&self, detail: &mut TaskDetail) {
        let task = &mut detail.task;
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = updated_at;
        }
    }
}

impl From<&TaskDetail> for TaskUpdate {
    /// Full replacement of the scalar fields from a server copy
    fn from(detail: &TaskDetail) -> Self {
        let task = &detail.task;
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            status: Some(task.status),
            priority: Some(task.priority),
            due_date: Some(task.due_date),
            updated_at: Some(task.updated_at),
        }
    }
}

impl From<&UpdateTaskRequest> for TaskUpdate {
    /// Optimistic local update from an outgoing edit (due date left to the
    /// server's echo, since parsing may fail there)
    fn from(req: &UpdateTaskRequest) -> Self {
        Self {
            title: req.title.clone(),
            description: req.description.clone().map(Some),
            status: req.status,
            priority: req.priority,
            due_date: None,
            updated_at: None,
        }
    }
}

/// Task list plus selection
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<TaskDetail>,
    selected: Option<TaskDetail>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[TaskDetail] {
        &self.tasks
    }

    pub fn selected(&self) -> Option<&TaskDetail> {
        self.selected.as_ref()
    }

    pub fn get(&self, task_id: Uuid) -> Option<&TaskDetail> {
        self.tasks.iter().find(|t| t.id() == task_id)
    }

    /// Replace the whole list (initial fetch)
    pub fn set_tasks(&mut self, tasks: Vec<TaskDetail>) {
        self.tasks = tasks;
    }

    pub fn set_selected(&mut self, task: Option<TaskDetail>) {
        self.selected = task;
    }

    /// Prepend a new task
    pub fn add_task(&mut self, task: TaskDetail) {
        self.tasks.insert(0, task);
    }

    /// Merge an update into the list entry and the selection
    pub fn update_task(&mut self, task_id: Uuid, update: &TaskUpdate) {
        self.for_each_copy(task_id, |detail| update.merge_into(detail));
    }

    /// Remove a task; clears the selection if it was selected
    pub fn delete_task(&mut self, task_id: Uuid) {
        self.tasks.retain(|t| t.id() != task_id);
        if self.selected.as_ref().is_some_and(|t| t.id() == task_id) {
            self.selected = None;
        }
    }

    pub fn add_comment(&mut self, task_id: Uuid, comment: Comment) {
        self.for_each_copy(task_id, |detail| detail.comments.push(comment.clone()));
    }

    pub fn add_file(&mut self, task_id: Uuid, file: FileAttachment) {
        self.for_each_copy(task_id, |detail| detail.files.push(file.clone()));
    }

    pub fn add_video(&mut self, task_id: Uuid, video: Video) {
        self.for_each_copy(task_id, |detail| detail.videos.push(video.clone()));
    }

    /// Fold a real-time event into the store
    pub fn apply(&mut self, event: &TaskEvent) {
        match event {
            TaskEvent::TaskCreated(detail) => {
                // Our own create may already be in the list from the REST response
                if self.get(detail.id()).is_none() {
                    self.add_task(detail.clone());
                }
            }
            TaskEvent::TaskUpdated(detail) => {
                self.update_task(detail.id(), &TaskUpdate::from(detail));
            }
            TaskEvent::TaskDeleted(task_id) => self.delete_task(*task_id),
            TaskEvent::CommentAdded(comment) => {
                self.add_comment(comment.task_id, comment.clone());
            }
            TaskEvent::FileUploaded(file) => self.add_file(file.task_id, file.clone()),
            TaskEvent::VideoAdded(video) => self.add_video(video.task_id, video.clone()),
        }
    }

    /// Run `f` on the list entry and on the selection when they match
    fn for_each_copy(&mut self, task_id: Uuid, mut f: impl FnMut(&mut TaskDetail)) {
        for detail in self.tasks.iter_mut().filter(|t| t.id() == task_id) {
            f(detail);
        }
        if let Some(selected) = self.selected.as_mut().filter(|t| t.id() == task_id) {
            f(selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskStatus};
    use crate::TaskPriority;
    use chrono::Utc;

    fn detail(title: &str) -> TaskDetail {
        let now = Utc::now();
        TaskDetail {
            task: Task {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: None,
                status: TaskStatus::Pending,
                priority: TaskPriority::Medium,
                due_date: None,
                author_id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            },
            author: None,
            files: vec![],
            videos: vec![],
            comments: vec![],
        }
    }

    fn comment(task_id: Uuid, content: &str) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            task_id,
            author_id: Uuid::new_v4(),
            created_at: Utc::now(),
            author: None,
        }
    }

    #[test]
    fn test_add_task_prepends() {
        let mut store = TaskStore::new();
        store.add_task(detail("first"));
        store.add_task(detail("second"));

        let titles: Vec<_> = store.tasks().iter().map(|t| t.task.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
    }

    #[test]
    fn test_update_reaches_list_and_selection() {
        let mut store = TaskStore::new();
        let task = detail("draft");
        let id = task.id();
        store.set_tasks(vec![task.clone()]);
        store.set_selected(Some(task));

        store.update_task(
            id,
            &TaskUpdate {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        );

        assert_eq!(store.get(id).unwrap().task.status, TaskStatus::InProgress);
        assert_eq!(store.selected().unwrap().task.status, TaskStatus::InProgress);
        assert_eq!(store.selected().unwrap().task.title, "draft");
    }

    #[test]
    fn test_delete_clears_matching_selection_only() {
        let mut store = TaskStore::new();
        let keep = detail("keep");
        let gone = detail("gone");
        store.set_tasks(vec![keep.clone(), gone.clone()]);

        store.set_selected(Some(keep.clone()));
        store.delete_task(gone.id());
        assert_eq!(store.tasks().len(), 1);
        assert!(store.selected().is_some());

        store.delete_task(keep.id());
        assert!(store.tasks().is_empty());
        assert!(store.selected().is_none());
    }

    #[test]
    fn test_comment_appended_to_both_copies() {
        let mut store = TaskStore::new();
        let task = detail("discuss");
        let id = task.id();
        store.set_tasks(vec![task.clone(), detail("other")]);
        store.set_selected(Some(task));

        store.apply(&TaskEvent::CommentAdded(comment(id, "first!")));

        assert_eq!(store.get(id).unwrap().comments.len(), 1);
        assert_eq!(store.selected().unwrap().comments[0].content, "first!");
        assert!(store.tasks()[1].comments.is_empty());
    }

    #[test]
    fn test_apply_created_is_not_duplicated() {
        let mut store = TaskStore::new();
        let task = detail("mine");
        store.add_task(task.clone());

        store.apply(&TaskEvent::TaskCreated(task));
        assert_eq!(store.tasks().len(), 1);

        store.apply(&TaskEvent::TaskCreated(detail("theirs")));
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].task.title, "theirs");
    }

    #[test]
    fn test_apply_updated_keeps_attachments() {
        let mut store = TaskStore::new();
        let task = detail("v1");
        let id = task.id();
        store.set_tasks(vec![task.clone()]);
        store.add_comment(id, comment(id, "keep me"));

        let mut remote = task;
        remote.task.title = "v2".to_string();
        remote.task.description = Some("now described".to_string());
        store.apply(&TaskEvent::TaskUpdated(remote));

        let local = store.get(id).unwrap();
        assert_eq!(local.task.title, "v2");
        assert_eq!(local.task.description.as_deref(), Some("now described"));
        assert_eq!(local.comments.len(), 1);
    }

    #[test]
    fn test_apply_deleted() {
        let mut store = TaskStore::new();
        let task = detail("gone");
        let id = task.id();
        store.set_tasks(vec![task]);

        store.apply(&TaskEvent::TaskDeleted(id));
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_optimistic_update_from_request() {
        let req = UpdateTaskRequest {
            title: Some("renamed".to_string()),
            due_date: Some("2025-01-01".to_string()),
            ..Default::default()
        };
        let update = TaskUpdate::from(&req);
        assert_eq!(update.title.as_deref(), Some("renamed"));
        assert!(update.due_date.is_none());
    }
}
