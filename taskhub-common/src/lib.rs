//! # TaskHub Common Library
//!
//! Shared code for the TaskHub service and its clients including:
//! - Domain models (users, tasks, comments, files, videos)
//! - Real-time event types (TaskEvent)
//! - API request schemas and validation
//! - Database initialization, migrations and queries
//! - Configuration loading
//! - Client-side task store

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod password;
pub mod store;
pub mod time;
pub mod youtube;

pub use error::{Error, Result};
pub use events::{Audience, TaskEvent};
pub use models::{TaskPriority, TaskStatus};
