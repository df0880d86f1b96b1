//! WebSocket upgrade handler for relay clients.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Attach to the client hub
//! 2. Forward normalized events from the client's queue to the socket
//! 3. Route inbound text frames to the hub
//! 4. Detach on close, which may tear down the upstream session

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use super::{hub::ClientHub, messages::ServerMessage};

/// State required for WebSocket handling.
///
/// Extracted from the application state.
#[derive(Clone)]
pub struct WebSocketState {
    /// Registry of attached clients.
    pub hub: Arc<ClientHub>,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(hub: Arc<ClientHub>) -> Self {
        Self { hub }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /` and `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection and always detaches the client
/// from the hub before returning.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    let (client, mut outbox) = state.hub.attach().await;
    let client_id = client.id();

    // Forward normalized events to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let msg = ServerMessage::from(&event);
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(
                    client_id = %client_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Handle incoming messages from client
    let hub = Arc::clone(&state.hub);
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    hub.handle_text(&client_id, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::trace!(client_id = %client_id, "Ignoring binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level keepalive, answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(client_id = %client_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(client_id = %client_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.detach(&client_id).await;
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoints.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
}
