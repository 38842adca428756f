//! Room Table
//!
//! Maps room keys to the ordered set of member connection identities.
//! Rooms are created lazily on first join and deleted as soon as their
//! member set empties; an entry exists iff it has at least one member.

use std::collections::HashMap;

use super::hub::ConnectionId;

/// Membership table for all active rooms.
///
/// Members are stored in insertion order so the snapshot handed to a new
/// joiner is deterministic. The table itself is not synchronized; the
/// [`ConnectionHub`](super::ConnectionHub) guards it with a lock so join
/// and disconnect cleanup never interleave.
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, Vec<ConnectionId>>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Add a connection to a room, creating the room if it doesn't exist.
    ///
    /// Returns the full member snapshot taken after insertion, including
    /// the new member, in insertion order. Joining a room twice is a no-op
    /// beyond returning the current snapshot.
    pub fn join(&mut self, room_id: &str, conn_id: &str) -> Vec<ConnectionId> {
        let members = self.rooms.entry(room_id.to_string()).or_default();
        if !members.iter().any(|m| m == conn_id) {
            members.push(conn_id.to_string());
        }
        members.clone()
    }

    /// Remove a connection from every room it belongs to.
    ///
    /// Returns one `(room key, remaining members)` pair per room the
    /// connection was actually removed from; rooms left empty are deleted
    /// and reported with an empty member list. Idempotent: a second call
    /// for the same identity finds no membership and returns nothing.
    pub fn leave_all(&mut self, conn_id: &str) -> Vec<(String, Vec<ConnectionId>)> {
        let mut affected = Vec::new();
        self.rooms.retain(|room_id, members| {
            let before = members.len();
            members.retain(|m| m != conn_id);
            if members.len() == before {
                return true;
            }
            affected.push((room_id.clone(), members.clone()));
            !members.is_empty()
        });
        affected
    }

    /// Current members of a room, if the room exists.
    pub fn members(&self, room_id: &str) -> Option<&[ConnectionId]> {
        self.rooms.get(room_id).map(Vec::as_slice)
    }

    /// Whether a connection is a member of a room.
    pub fn contains(&self, room_id: &str, conn_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().any(|m| m == conn_id))
            .unwrap_or(false)
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
