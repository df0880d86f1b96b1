//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the session logic to external systems:
//! - `webcast` - upstream live source over a WebSocket bridge
//! - `scripted` - in-memory live source for tests and demos
//! - `websocket` - client-facing WebSocket transport and hub
//! - `http` - HTTP router, health probe and middleware

pub mod http;
pub mod scripted;
pub mod webcast;
pub mod websocket;

pub use scripted::{ScriptStats, ScriptedOutcome, ScriptedSource};
pub use webcast::WebcastSource;
pub use websocket::{ClientHub, WebSocketState};
