//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Request schemas and their validation (pure functions)
//! - Response shapes
//!
//! The server wraps these with framework-specific extractors (Axum).

pub mod types;

pub use types::{
    CreateCommentRequest, CreateTaskRequest, CreateVideoRequest, ErrorResponse, LoginRequest,
    MessageResponse, RegisterRequest, UpdateTaskRequest, Validate, VideoQuery,
};
