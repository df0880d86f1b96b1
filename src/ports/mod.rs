//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the session logic and the outside world. Adapters implement these ports.
//!
//! - `LiveEventSource` / `LiveConnection` - the upstream live stream
//! - `ClientSink` - delivery of normalized events to one attached client

mod client_sink;
mod live_source;

pub use client_sink::{ClientSink, SinkError};
pub use live_source::{EventStream, LiveConnection, LiveEventSource, SourceError};
