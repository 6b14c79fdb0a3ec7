//! Real-time fan-out of task events
//!
//! A single [`RoomHub`] carries every published event together with its
//! audience. WebSocket and SSE connections each hold a receiver and drop
//! events whose audience they are not part of.

pub mod hub;
pub mod messages;

pub use hub::{Published, RoomHub};
pub use messages::{ClientMessage, ServerError};
