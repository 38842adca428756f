//! WebSocket Room Relay
//!
//! Real-time fanout of ephemeral collaboration events between connected
//! clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Connection registry plus broadcast router
//! - **RoomTable**: Room key → ordered member set, create-on-join,
//!   delete-on-empty
//! - **Handler**: WebSocket upgrade, per-connection loops, event dispatch
//! - **Messages**: The closed set of client and server event variants
//!
//! ## Usage
//!
//! Clients connect to `/ws`, join a room, and exchange events:
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'join', roomId: 'main'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg);
//! };
//! ```
//!
//! After joining, the client receives a `user-list` snapshot; peers in the
//! room receive `user-joined`. Message, cursor and typing events are
//! relayed to every other connected peer; disconnects produce
//! `user-disconnected` notices to the rooms the connection belonged to.

mod handler;
mod hub;
mod messages;
mod rooms;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientEvent, ServerEvent};
pub use rooms::RoomTable;
