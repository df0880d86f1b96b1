//! WebSocket adapters for relay clients.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  WebSocket clients (browsers)                │
//! └──────────────────────────────────────────────────────────────┘
//!            │ {"type":"connect",...}          ▲ {"type":"chat",...}
//!            ▼                                 │
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ClientHub                            │
//! │   - attach / detach sockets                                  │
//! │   - route connect requests                                   │
//! │   - teardown when the last client leaves                     │
//! └──────────────────────────────────────────────────────────────┘
//!            │ connect / disconnect            ▲ NormalizedEvent
//!            ▼                                 │ (requesting client only)
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      SessionManager                          │
//! │   single upstream session, generation-checked results        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`hub`] - Client registry and request routing
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use hub::{ClientHub, ClientSocket, DEFAULT_OUTBOX_CAPACITY};
pub use messages::{ClientMessage, MessageData, ServerMessage};
