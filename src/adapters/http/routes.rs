//! Route configuration for the relay server.

use axum::routing::get;
use axum::Router;
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};

use super::health::health_handler;

/// Creates the application router.
///
/// Routes:
/// - `GET /` - WebSocket upgrade
/// - `GET /ws` - WebSocket upgrade
/// - `GET /health` - Health probe
pub fn app_router(state: WebSocketState, cors_origins: &[String]) -> Router {
    websocket_router()
        .route("/health", get(health_handler))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origins. No origins means any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET])
}
