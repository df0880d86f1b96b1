//! ClientSink port - delivery of normalized events to a single client.

use thiserror::Error;

use crate::domain::foundation::ClientId;
use crate::domain::live::NormalizedEvent;

/// Errors raised when an event cannot be handed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The client detached or its transport closed.
    #[error("Client {0} is no longer attached")]
    Closed(ClientId),

    /// The client's outbound queue is full; the event was dropped.
    #[error("Client {0} is not keeping up, event dropped")]
    Backlogged(ClientId),
}

/// Destination for the events of one upstream session.
///
/// The session manager holds the requesting client's sink for as long as the
/// session lives. Delivery must not block; a failure is reported, never
/// retried.
pub trait ClientSink: Send + Sync {
    /// Identity of the client behind this sink (for logging).
    fn client_id(&self) -> ClientId;

    /// Hand one event to the client's transport.
    fn deliver(&self, event: NormalizedEvent) -> Result<(), SinkError>;
}
