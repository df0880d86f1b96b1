//! Live event source port - Interface to the upstream live stream provider.
//!
//! Opening a connection is synchronous and performs no I/O; it fails only
//! for identifiers the provider can never serve. Connecting, reading events
//! and closing are asynchronous.
//!
//! # Example
//!
//! ```ignore
//! let mut connection = source.open("alice")?;
//! let room = connection.connect().await?;
//! while let Some(event) = connection.next_event().await {
//!     handle(event?);
//! }
//! connection.disconnect().await;
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::live::{LiveEvent, RoomInfo};

/// Errors that can occur while talking to the upstream live source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The identifier can never name a live room.
    #[error("Invalid identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// Network-level failure reaching the upstream.
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// The upstream answered but refused the room.
    #[error("Upstream rejected connection: {0}")]
    Rejected(String),

    /// The connect attempt did not finish in time.
    #[error("Upstream did not respond within {secs}s")]
    Timeout { secs: u64 },

    /// The upstream sent something that could not be understood.
    #[error("Upstream protocol error: {0}")]
    Protocol(String),

    /// Operation attempted on a connection that is not open.
    #[error("Upstream connection closed")]
    Closed,
}

/// Item type yielded by [`LiveConnection::next_event`].
pub type EventStream = Option<Result<LiveEvent, SourceError>>;

/// Port for creating upstream live connections.
pub trait LiveEventSource: Send + Sync {
    /// Build an unconnected connection for the given identifier.
    ///
    /// Must not perform network I/O.
    fn open(&self, identifier: &str) -> Result<Box<dyn LiveConnection>, SourceError>;
}

/// One upstream connection to a live room.
#[async_trait]
pub trait LiveConnection: Send {
    /// Perform the single connect attempt.
    async fn connect(&mut self) -> Result<RoomInfo, SourceError>;

    /// Wait for the next forwarded event.
    ///
    /// Returns `None` once the stream has ended. Must be cancel-safe: the
    /// caller may drop the future to react to a teardown signal.
    async fn next_event(&mut self) -> EventStream;

    /// Close the upstream transport. Idempotent.
    async fn disconnect(&mut self);
}
