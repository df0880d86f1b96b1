//! Health probe endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::adapters::websocket::WebSocketState;
use crate::application::SessionSnapshot;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub clients: usize,
    pub session: Option<SessionSnapshot>,
}

/// Reports attached clients and the upstream session.
///
/// Route: `GET /health`
pub async fn health_handler(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        clients: state.hub.client_count().await,
        session: state.hub.sessions().snapshot().await,
    })
}
