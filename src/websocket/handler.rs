//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests, the per-connection send/receive
//! loops, and dispatch of decoded client events to the hub.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientEvent, ServerEvent};
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection to WebSocket and starts event handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sender, mut receiver) = socket.split();

    // Channel carrying outbound events for this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Register with hub; this assigns the connection identity
    let connection_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            if let Ok(text) = serde_json::to_string(&ServerEvent::Error {
                message: e.to_string(),
            }) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };

    // Tell the client its assigned identity
    if hub
        .send_to(
            &connection_id,
            ServerEvent::Connected {
                connection_id: connection_id.clone(),
            },
        )
        .await
        .is_err()
    {
        tracing::error!(connection_id = %connection_id, "Failed to send connected event");
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();

    // Task to forward events from the channel to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                }
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive frames from the WebSocket and dispatch them.
    // Each event is handled to completion before the next is read, so
    // relays from one connection keep their emission order.
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Cleanup: leave every room and notify remaining members
    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &Arc<ConnectionHub>,
    connection_id: &str,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    handle_client_event(hub, connection_id, event).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client event"
                    );
                    // Report the decode failure but keep the connection open
                    let error_event = ServerEvent::Error {
                        message: format!("Invalid event format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_event).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_event = ServerEvent::Error {
                message: "Binary frames not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_event).await;
            true
        }
        Message::Ping(_) => {
            // Axum handles ping/pong automatically
            true
        }
        Message::Pong(_) => {
            // Received pong, connection is alive
            true
        }
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Dispatch a decoded client event
///
/// Maps each event kind to the hub call and delivery mode it requires:
/// joins go through the room table and answer with the member snapshot;
/// everything else is a fire-and-forget relay to all connected peers.
async fn handle_client_event(hub: &Arc<ConnectionHub>, connection_id: &str, event: ClientEvent) {
    match event {
        ClientEvent::Join { room_id } => {
            let members = hub.join(&room_id, connection_id).await;
            let _ = hub
                .send_to(connection_id, ServerEvent::UserList { members })
                .await;
        }
        ClientEvent::TranscribedText {
            text,
            user_id,
            username,
            timestamp,
        } => {
            tracing::debug!(connection_id = %connection_id, username = %username, "Relaying message");
            hub.broadcast_to_peers(
                connection_id,
                ServerEvent::TranscribedText {
                    text,
                    user_id,
                    username,
                    timestamp,
                },
            )
            .await;
        }
        ClientEvent::UsernameChange { user_id, username } => {
            tracing::debug!(connection_id = %connection_id, username = %username, "Username change");
            hub.broadcast_to_peers(
                connection_id,
                ServerEvent::UsernameChange { user_id, username },
            )
            .await;
        }
        ClientEvent::CursorMove {
            x,
            y,
            user_id,
            username,
        } => {
            hub.broadcast_to_peers(
                connection_id,
                ServerEvent::CursorMove {
                    x,
                    y,
                    user_id,
                    username,
                    timestamp: now_millis(),
                },
            )
            .await;
        }
        ClientEvent::LiveTyping {
            text,
            user_id,
            username,
        } => {
            hub.broadcast_to_peers(
                connection_id,
                ServerEvent::LiveTyping {
                    text,
                    user_id,
                    username,
                    timestamp: now_millis(),
                },
            )
            .await;
        }
    }
}

/// Current time in epoch milliseconds, used to stamp relayed events
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
