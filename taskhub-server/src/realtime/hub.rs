//! Room membership and event broadcast

use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use taskhub_common::{Audience, TaskEvent};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// An event on its way to subscribers
#[derive(Debug, Clone)]
pub struct Published {
    pub audience: Audience,
    pub event: TaskEvent,
}

/// Broadcast hub plus room membership
///
/// Cloning is cheap; all clones share the same channel and rooms.
#[derive(Clone)]
pub struct RoomHub {
    tx: broadcast::Sender<Published>,
    /// room name -> member connections
    rooms: Arc<DashMap<String, HashSet<Uuid>>>,
    /// connection -> joined rooms
    connections: Arc<DashMap<Uuid, HashSet<String>>>,
}

impl fmt::Debug for RoomHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomHub")
            .field("connection_count", &self.connections.len())
            .field("room_count", &self.rooms.len())
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl RoomHub {
    /// Create a hub buffering up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        info!("Room hub initialized with capacity {}", capacity);

        Self {
            tx,
            rooms: Arc::new(DashMap::new()),
            connections: Arc::new(DashMap::new()),
        }
    }

    /// Send an event to `audience`
    ///
    /// Returns the number of receivers that got it. Zero listeners is fine.
    pub fn publish(&self, audience: Audience, event: TaskEvent) -> usize {
        let name = event.name();
        match self.tx.send(Published { audience, event }) {
            Ok(count) => {
                debug!("Published {} to {} receivers", name, count);
                count
            }
            Err(_) => {
                debug!("Published {} with no receivers", name);
                0
            }
        }
    }

    /// Publish to the event's default audience
    pub fn publish_event(&self, event: TaskEvent) -> usize {
        self.publish(event.audience(), event)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.tx.subscribe()
    }

    /// Register a connection with no rooms
    pub fn connect(&self, conn_id: Uuid) {
        self.connections.entry(conn_id).or_default();
    }

    /// Add a connection to a room (joining twice is a no-op)
    pub fn join(&self, room: &str, conn_id: Uuid) {
        self.rooms.entry(room.to_string()).or_default().insert(conn_id);
        self.connections
            .entry(conn_id)
            .or_default()
            .insert(room.to_string());
        debug!("Connection {} joined {}", conn_id, room);
    }

    /// Remove a connection from a room; empty rooms are dropped
    pub fn leave(&self, room: &str, conn_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn_id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());

        if let Some(mut joined) = self.connections.get_mut(&conn_id) {
            joined.remove(room);
        }
        debug!("Connection {} left {}", conn_id, room);
    }

    /// Forget a connection and every room it was in
    pub fn disconnect(&self, conn_id: Uuid) {
        let Some((_, joined)) = self.connections.remove(&conn_id) else {
            return;
        };

        for room in joined {
            if let Some(mut members) = self.rooms.get_mut(&room) {
                members.remove(&conn_id);
            }
            self.rooms.remove_if(&room, |_, members| members.is_empty());
        }
        debug!("Connection {} disconnected", conn_id);
    }

    pub fn is_member(&self, room: &str, conn_id: Uuid) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(&conn_id))
    }

    /// Whether a connection should receive an event sent to `audience`
    pub fn delivers_to(&self, conn_id: Uuid, audience: &Audience) -> bool {
        match audience {
            Audience::All => true,
            Audience::Room(room) => self.is_member(room, conn_id),
        }
    }

    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|members| members.len()).unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new(taskhub_common::config::DEFAULT_EVENT_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_common::events::task_room;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_join_leave_and_room_size() {
        let hub = RoomHub::new(8);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let room = task_room(Uuid::new_v4());

        hub.join(&room, a);
        hub.join(&room, a);
        hub.join(&room, b);
        assert_eq!(hub.room_size(&room), 2);
        assert_eq!(hub.connection_count(), 2);

        hub.leave(&room, a);
        assert!(!hub.is_member(&room, a));
        assert!(hub.is_member(&room, b));

        hub.leave(&room, b);
        assert_eq!(hub.room_size(&room), 0);
    }

    #[test]
    fn test_disconnect_clears_every_room() {
        let hub = RoomHub::new(8);
        let conn = Uuid::new_v4();
        let other = Uuid::new_v4();
        hub.join("task:1", conn);
        hub.join("task:2", conn);
        hub.join("task:2", other);

        hub.disconnect(conn);

        assert_eq!(hub.room_size("task:1"), 0);
        assert_eq!(hub.room_size("task:2"), 1);
        assert_eq!(hub.connection_count(), 1);

        // Unknown connections are ignored
        hub.disconnect(Uuid::new_v4());
    }

    #[test]
    fn test_delivery_rules() {
        let hub = RoomHub::new(8);
        let conn = Uuid::new_v4();
        hub.connect(conn);
        hub.join("task:a", conn);

        assert!(hub.delivers_to(conn, &Audience::All));
        assert!(hub.delivers_to(conn, &Audience::Room("task:a".into())));
        assert!(!hub.delivers_to(conn, &Audience::Room("task:b".into())));
    }

    #[test]
    fn test_publish_without_listeners() {
        let hub = RoomHub::new(8);
        assert_eq!(hub.publish_event(TaskEvent::TaskDeleted(Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_with_audience() {
        let hub = RoomHub::new(8);
        let mut rx = hub.subscribe();
        let task_id = Uuid::new_v4();

        assert_eq!(hub.publish_event(TaskEvent::TaskDeleted(task_id)), 1);

        let published = rx.recv().await.unwrap();
        assert_eq!(published.audience, Audience::All);
        assert_eq!(published.event, TaskEvent::TaskDeleted(task_id));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_continues() {
        let hub = RoomHub::new(2);
        let mut rx = hub.subscribe();
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        for id in &ids {
            hub.publish_event(TaskEvent::TaskDeleted(*id));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(2))));
        let next = rx.recv().await.unwrap();
        assert_eq!(next.event, TaskEvent::TaskDeleted(ids[2]));
    }
}
