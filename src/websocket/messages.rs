//! WebSocket Event Types
//!
//! Defines the closed set of events exchanged between clients and the
//! relay. Events are JSON text frames discriminated by a kebab-case
//! `type` field; payload fields are camelCase on the wire.

use serde::{Deserialize, Serialize};

use super::hub::ConnectionId;

/// Events sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join a room, creating it if it doesn't exist yet
    #[serde(rename_all = "camelCase")]
    Join {
        /// Key of the room to join
        room_id: String,
    },
    /// A finished text message to relay to peers, verbatim
    #[serde(rename_all = "camelCase")]
    TranscribedText {
        text: String,
        user_id: String,
        username: String,
        /// Client-side timestamp in epoch milliseconds, passed through
        timestamp: i64,
    },
    /// The sender renamed themselves
    #[serde(rename_all = "camelCase")]
    UsernameChange { user_id: String, username: String },
    /// Cursor position update; the server stamps the relay timestamp
    #[serde(rename_all = "camelCase")]
    CursorMove {
        x: f64,
        y: f64,
        user_id: String,
        username: String,
    },
    /// In-progress typing text; the server stamps the relay timestamp
    #[serde(rename_all = "camelCase")]
    LiveTyping {
        text: String,
        user_id: String,
        username: String,
    },
}

/// Events sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Connection established; carries the assigned identity
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: ConnectionId },
    /// Member snapshot sent to a joiner, in insertion order, self included
    UserList { members: Vec<ConnectionId> },
    /// Another connection joined the recipient's room
    #[serde(rename_all = "camelCase")]
    UserJoined { conn_id: ConnectionId },
    /// A room member's connection went away
    #[serde(rename_all = "camelCase")]
    UserDisconnected { conn_id: ConnectionId },
    /// Relayed text message, verbatim payload
    #[serde(rename_all = "camelCase")]
    TranscribedText {
        text: String,
        user_id: String,
        username: String,
        timestamp: i64,
    },
    /// Relayed username change
    #[serde(rename_all = "camelCase")]
    UsernameChange { user_id: String, username: String },
    /// Relayed cursor position with server-assigned timestamp
    #[serde(rename_all = "camelCase")]
    CursorMove {
        x: f64,
        y: f64,
        user_id: String,
        username: String,
        /// Epoch milliseconds, stamped at relay time
        timestamp: i64,
    },
    /// Relayed live-typing text with server-assigned timestamp
    #[serde(rename_all = "camelCase")]
    LiveTyping {
        text: String,
        user_id: String,
        username: String,
        /// Epoch milliseconds, stamped at relay time
        timestamp: i64,
    },
    /// Error message (e.g. a frame that failed to decode)
    Error { message: String },
}
