//! Process-local room membership for real-time fan-out.
//!
//! Each live WebSocket registers the sending half of its outbound channel
//! under the room it joined. Nothing here is durable: a restart empties the
//! table and clients rebuild it by joining again.

use std::collections::HashMap;

use dashmap::DashMap;
use domains::chat::{RoomKey, ServerEvent};
use domains::ports::MessageFanout;
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

pub type ConnectionId = Uuid;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomKey, HashMap<ConnectionId, mpsc::Sender<String>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room: RoomKey, conn: ConnectionId, outbound: mpsc::Sender<String>) {
        trace!(%room, %conn, "joined room");
        self.rooms.entry(room).or_default().insert(conn, outbound);
    }

    pub fn leave(&self, room: &RoomKey, conn: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }

    pub fn connections(&self, room: &RoomKey) -> usize {
        self.rooms.get(room).map_or(0, |members| members.len())
    }
}

impl MessageFanout for RoomRegistry {
    /// Best effort: a full or closed connection simply misses the event.
    fn deliver(&self, room: &RoomKey, event: ServerEvent) -> usize {
        let Some(members) = self.rooms.get(room) else {
            return 0;
        };
        let frame = event.encode();
        members
            .values()
            .filter(|outbound| outbound.try_send(frame.clone()).is_ok())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event() -> ServerEvent {
        ServerEvent::Error { message: "ping".into() }
    }

    #[tokio::test]
    async fn delivers_only_to_the_named_room() {
        let registry = RoomRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.join(RoomKey::for_user(1), Uuid::new_v4(), tx_a);
        registry.join(RoomKey::for_user(2), Uuid::new_v4(), tx_b);

        assert_eq!(registry.deliver(&RoomKey::for_user(1), error_event()), 1);
        assert!(rx_a.recv().await.unwrap().contains("\"event\":\"error\""));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_connection_of_a_user_receives() {
        let registry = RoomRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        registry.join(RoomKey::for_user(1), Uuid::new_v4(), tx1);
        registry.join(RoomKey::for_user(1), Uuid::new_v4(), tx2);

        assert_eq!(registry.deliver(&RoomKey::for_user(1), error_event()), 2);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[test]
    fn leaving_empties_the_room() {
        let registry = RoomRegistry::new();
        let conn = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(1);
        registry.join(RoomKey::for_user(3), conn, tx);
        assert_eq!(registry.connections(&RoomKey::for_user(3)), 1);

        registry.leave(&RoomKey::for_user(3), conn);
        assert_eq!(registry.connections(&RoomKey::for_user(3)), 0);
        assert_eq!(registry.deliver(&RoomKey::for_user(3), error_event()), 0);
    }

    #[test]
    fn full_connection_misses_the_event() {
        let registry = RoomRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.join(RoomKey::for_user(4), Uuid::new_v4(), tx);
        assert_eq!(registry.deliver(&RoomKey::for_user(4), error_event()), 1);
        assert_eq!(registry.deliver(&RoomKey::for_user(4), error_event()), 0);
    }
}
