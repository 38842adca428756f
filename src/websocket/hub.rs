//! WebSocket Connection Hub
//!
//! Owns the connection registry and the room table, and routes outbound
//! events: to one connection, to all connected peers except an originator,
//! or to the members of a room. All delivery is a non-blocking enqueue
//! onto per-connection channels; a send to a dead peer is dropped silently.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::ServerEvent;
use super::rooms::RoomTable;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and room membership
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
    /// Room membership, guarded so join and disconnect cleanup serialize
    rooms: Arc<RwLock<RoomTable>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending events to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RwLock::new(RoomTable::new())),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the freshly assigned connection identity, or an error if
    /// the connection limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<ConnectionId, HubError> {
        let connections = self.connections.read().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections {
                limit: self.config.max_connections,
            });
        }
        drop(connections);

        let id = Uuid::new_v4().to_string();
        let handle = ConnectionHandle { sender };

        self.connections.write().await.insert(id.clone(), handle);

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its room membership
    ///
    /// Removes the identity from every room it belongs to, notifies the
    /// remaining members of each affected room with a `user-disconnected`
    /// event, and deletes rooms left empty. Safe to call for an unknown or
    /// already-unregistered identity; the second call finds no membership
    /// and emits nothing.
    pub async fn unregister(&self, id: &str) {
        let removed = self.connections.write().await.remove(id);

        // Remaining members per affected room, captured under the room
        // lock, so notices go to exactly the members present at the moment
        // the disconnect was processed.
        let affected = self.rooms.write().await.leave_all(id);

        for (room_id, remaining) in &affected {
            tracing::info!(
                connection_id = %id,
                room_id = %room_id,
                remaining = remaining.len(),
                "Left room on disconnect"
            );
            self.send_to_many(
                remaining,
                &ServerEvent::UserDisconnected {
                    conn_id: id.to_string(),
                },
            )
            .await;
        }

        if removed.is_some() {
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
    }

    /// Add a connection to a room, creating the room if needed
    ///
    /// Returns the member snapshot including the new member, in insertion
    /// order. Side effect: every *other* current member receives a
    /// `user-joined` notice (room-scoped, fire-and-forget).
    pub async fn join(&self, room_id: &str, conn_id: &str) -> Vec<ConnectionId> {
        let snapshot = self.rooms.write().await.join(room_id, conn_id);

        let peers: Vec<ConnectionId> = snapshot
            .iter()
            .filter(|m| m.as_str() != conn_id)
            .cloned()
            .collect();
        self.send_to_many(
            &peers,
            &ServerEvent::UserJoined {
                conn_id: conn_id.to_string(),
            },
        )
        .await;

        tracing::info!(
            connection_id = %conn_id,
            room_id = %room_id,
            members = snapshot.len(),
            "Joined room"
        );

        snapshot
    }

    /// Send an event directly to a specific connection
    pub async fn send_to(&self, id: &str, event: ServerEvent) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(event).map_err(|_| HubError::SendFailed)
    }

    /// Broadcast an event to every connected session except the originator
    ///
    /// Deliberately not room-scoped: message, cursor and typing relays go
    /// to all connected peers server-wide.
    pub async fn broadcast_to_peers(&self, exclude: &str, event: ServerEvent) {
        let connections = self.connections.read().await;

        let mut sent = 0;
        for (id, handle) in connections.iter() {
            if id == exclude {
                continue;
            }
            if handle.sender.send(event.clone()).is_ok() {
                sent += 1;
            }
        }

        if sent > 0 {
            tracing::trace!(origin = %exclude, peers = sent, "Relayed event to peers");
        }
    }

    /// Broadcast an event to every current member of a room, inclusive
    pub async fn broadcast_to_room(&self, room_id: &str, event: ServerEvent) {
        let members = {
            let rooms = self.rooms.read().await;
            rooms.members(room_id).map(<[_]>::to_vec).unwrap_or_default()
        };
        self.send_to_many(&members, &event).await;
    }

    /// Broadcast an event to a room's members except one connection
    ///
    /// Room-scoped alternative to [`broadcast_to_peers`] for callers that
    /// want isolation between rooms.
    ///
    /// [`broadcast_to_peers`]: Self::broadcast_to_peers
    pub async fn broadcast_to_room_peers(&self, room_id: &str, exclude: &str, event: ServerEvent) {
        let members: Vec<ConnectionId> = {
            let rooms = self.rooms.read().await;
            rooms
                .members(room_id)
                .map(|m| {
                    m.iter()
                        .filter(|c| c.as_str() != exclude)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        self.send_to_many(&members, &event).await;
    }

    /// Enqueue an event for each listed connection, dropping dead targets
    async fn send_to_many(&self, ids: &[ConnectionId], event: &ServerEvent) {
        let connections = self.connections.read().await;
        for id in ids {
            if let Some(handle) = connections.get(id) {
                let _ = handle.sender.send(event.clone());
            }
        }
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get the current count of non-empty rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.room_count()
    }

    /// Current members of a room, if it exists
    pub async fn room_members(&self, room_id: &str) -> Option<Vec<ConnectionId>> {
        self.rooms.read().await.members(room_id).map(<[_]>::to_vec)
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {limit})")]
    TooManyConnections { limit: usize },

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send event")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.max_connections, 1000);
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let config = HubConfig { max_connections: 2 };
        let hub = ConnectionHub::new(config);

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let (tx3, _rx3) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(
            result.unwrap_err(),
            HubError::TooManyConnections { limit: 2 }
        ));

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_join_returns_snapshot_in_join_order() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();

        let snapshot = hub.join("main", &a).await;
        assert_eq!(snapshot, vec![a.clone()]);

        let snapshot = hub.join("main", &b).await;
        assert_eq!(snapshot, vec![a.clone(), b.clone()]);
    }

    #[tokio::test]
    async fn test_join_notifies_existing_members_only() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();

        hub.join("main", &a).await;
        // A joined an empty room: nobody to notify
        assert!(rx1.try_recv().is_err());

        hub.join("main", &b).await;
        // A hears about B; B gets no join notice about itself
        match rx1.try_recv().unwrap() {
            ServerEvent::UserJoined { conn_id } => assert_eq!(conn_id, b),
            other => panic!("Expected UserJoined, got {:?}", other),
        }
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_peers_broadcast_excludes_originator() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let _b = hub.register(tx2).await.unwrap();
        let c = hub.register(tx3).await.unwrap();

        // Peers broadcast is global: C is in a different room, B in none
        hub.join("main", &a).await;
        hub.join("side", &c).await;
        drain(&mut rx1);
        drain(&mut rx3);

        let event = ServerEvent::TranscribedText {
            text: "hi".to_string(),
            user_id: a.clone(),
            username: "alice".to_string(),
            timestamp: 1699000000000,
        };
        hub.broadcast_to_peers(&a, event).await;

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
        assert!(matches!(
            rx3.try_recv().unwrap(),
            ServerEvent::TranscribedText { .. }
        ));
    }

    #[tokio::test]
    async fn test_room_broadcast_is_inclusive() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();

        hub.join("main", &a).await;
        hub.join("side", &b).await;
        drain(&mut rx1);
        drain(&mut rx2);

        hub.broadcast_to_room(
            "main",
            ServerEvent::UserDisconnected {
                conn_id: "x".to_string(),
            },
        )
        .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_room_peers_broadcast_excludes_sender() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();
        let c = hub.register(tx3).await.unwrap();

        hub.join("main", &a).await;
        hub.join("main", &b).await;
        hub.join("side", &c).await;
        drain(&mut rx1);
        drain(&mut rx2);
        drain(&mut rx3);

        hub.broadcast_to_room_peers(
            "main",
            &a,
            ServerEvent::UsernameChange {
                user_id: a.clone(),
                username: "alice".to_string(),
            },
        )
        .await;

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_room_members() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();

        hub.join("main", &a).await;
        hub.join("main", &b).await;
        drain(&mut rx1);
        drain(&mut rx2);

        hub.unregister(&a).await;

        match rx2.try_recv().unwrap() {
            ServerEvent::UserDisconnected { conn_id } => assert_eq!(conn_id, a),
            other => panic!("Expected UserDisconnected, got {:?}", other),
        }
        // The departed connection hears nothing
        assert!(rx1.try_recv().is_err());

        assert_eq!(hub.room_members("main").await, Some(vec![b.clone()]));
    }

    #[tokio::test]
    async fn test_disconnect_of_last_member_deletes_room() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();

        hub.join("main", &a).await;
        hub.join("main", &b).await;

        hub.unregister(&a).await;
        assert_eq!(hub.room_count().await, 1);

        hub.unregister(&b).await;
        assert_eq!(hub.room_count().await, 0);
        assert_eq!(hub.room_members("main").await, None);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();

        hub.join("main", &a).await;
        hub.join("main", &b).await;
        drain(&mut rx2);

        hub.unregister(&a).await;
        assert_eq!(drain(&mut rx2).len(), 1);

        // Second cleanup for the same identity: no error, no duplicate notice
        hub.unregister(&a).await;
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_unregister_unknown_identity_is_noop() {
        let hub = ConnectionHub::new(HubConfig::default());
        hub.unregister("ghost").await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection() {
        let hub = ConnectionHub::new(HubConfig::default());
        let result = hub
            .send_to(
                "ghost",
                ServerEvent::UserList {
                    members: Vec::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(HubError::ConnectionNotFound)));
    }

    #[tokio::test]
    async fn test_member_snapshots_track_disconnects() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let (tx3, _rx3) = mpsc::unbounded_channel();
        let a = hub.register(tx1).await.unwrap();
        let b = hub.register(tx2).await.unwrap();
        let c = hub.register(tx3).await.unwrap();

        hub.join("main", &a).await;
        hub.join("main", &b).await;
        hub.unregister(&a).await;

        // The third joiner sees exactly the still-connected members
        let snapshot = hub.join("main", &c).await;
        assert_eq!(snapshot, vec![b.clone(), c.clone()]);
    }
}
