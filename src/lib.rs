//! # Hearsay
//!
//! Real-time room broadcast relay. Clients join a shared room over a
//! WebSocket and the server fans out ephemeral events - transcribed text,
//! cursor positions, live-typing deltas, username changes - to the other
//! participants, tracking membership as connections come and go.
//!
//! ## Features
//!
//! - **Room membership**: rooms are created on first join and deleted the
//!   moment they empty; a disconnect clears the connection from every room
//!   it belonged to and notifies the remaining members
//! - **Three delivery modes**: self-only acks, global peers-only relays,
//!   and room-inclusive notices
//! - **Fire-and-forget fanout**: non-blocking enqueue per connection; a
//!   dead peer never stalls the dispatch loop
//! - **Typed protocol**: a closed set of tagged JSON event variants,
//!   decoded at the transport boundary
//!
//! ## Modules
//!
//! - [`websocket`]: Connection hub, room table, event types and handler
//! - [`api`]: HTTP surface (info, health probes, WebSocket upgrade)
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hearsay::api::{serve, AppState};
//! use hearsay::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let state = AppState::new(config.server.clone());
//!     serve(state, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, ApiResult, AppState};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig};

pub use websocket::{
    websocket_handler, ClientEvent, ConnectionHub, ConnectionId, HubConfig, HubError, RoomTable,
    ServerEvent,
};
