//! Session manager - owner of the single upstream live session.
//!
//! At most one upstream session exists at a time. A connect request replaces
//! whatever session is installed; `disconnect` clears it.
//!
//! # Lifecycle
//!
//! ```text
//! connect(id) ──► open (sync) ──┬─ Err ──► internal error to requester, no session
//!                               │
//!                               └─ Ok ───► install generation N (Connecting)
//!                                          spawn session task
//!                                               │
//!                                   connect().await
//!                                   ├─ Ok  ─► Connected, relay events
//!                                   └─ Err ─► Failed, error to requester
//! ```
//!
//! Every result produced by a session task is applied only if its generation
//! is still the installed one. Results of replaced sessions are discarded and
//! their transport closed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::domain::foundation::{ClientId, SessionGeneration, StateMachine};
use crate::domain::live::{translate, LiveEvent, NormalizedEvent, RoomInfo, UpstreamStatus};
use crate::ports::{ClientSink, LiveConnection, LiveEventSource, SourceError};

/// Read-only view of the installed upstream session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub identifier: String,
    pub status: UpstreamStatus,
    pub generation: SessionGeneration,
    pub requester: ClientId,
    pub started_at: DateTime<Utc>,
}

/// Owns the single upstream session and its lifecycle.
pub struct SessionManager {
    source: Arc<dyn LiveEventSource>,
    state: Arc<Mutex<ManagerState>>,
    announce_connected: bool,
}

#[derive(Default)]
struct ManagerState {
    /// Last generation handed out.
    generation: SessionGeneration,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    generation: SessionGeneration,
    identifier: String,
    status: UpstreamStatus,
    requester: ClientId,
    started_at: DateTime<Utc>,
    shutdown: watch::Sender<bool>,
}

impl ActiveSession {
    /// Signal the session task to stop. The transport closes asynchronously.
    fn teardown(self) {
        // The task may already have exited after a failed connect.
        let _ = self.shutdown.send(true);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identifier: self.identifier.clone(),
            status: self.status,
            generation: self.generation,
            requester: self.requester,
            started_at: self.started_at,
        }
    }
}

impl ManagerState {
    fn is_current(&self, generation: SessionGeneration) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    /// Moves the session of `generation` to `target`.
    ///
    /// Returns false when the session was replaced or cleared, or the
    /// transition is not allowed.
    fn advance(&mut self, generation: SessionGeneration, target: UpstreamStatus) -> bool {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.generation == generation)
        else {
            return false;
        };

        match active.status.transition_to(target) {
            Ok(next) => {
                active.status = next;
                true
            }
            Err(e) => {
                tracing::warn!(
                    generation = %generation,
                    error = %e,
                    "Ignoring invalid upstream status change"
                );
                false
            }
        }
    }
}

impl SessionManager {
    /// Create a manager that opens upstream connections through `source`.
    pub fn new(source: Arc<dyn LiveEventSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(ManagerState::default())),
            announce_connected: false,
        }
    }

    /// Also send a `connected` event to the requester when a connect succeeds.
    pub fn with_connect_announcement(mut self, enabled: bool) -> Self {
        self.announce_connected = enabled;
        self
    }

    /// Replace any installed session with a new one for `identifier`.
    ///
    /// Events of the new session are delivered to `requester` only.
    pub async fn connect(&self, identifier: &str, requester: Arc<dyn ClientSink>) {
        let mut state = self.state.lock().await;

        if let Some(previous) = state.active.take() {
            tracing::info!(
                identifier = %previous.identifier,
                generation = %previous.generation,
                "Replacing upstream session"
            );
            previous.teardown();
        }

        let connection = match self.source.open(identifier) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!(identifier, error = %e, "Error during connection attempt");
                deliver(requester.as_ref(), NormalizedEvent::internal_error());
                return;
            }
        };

        let generation = state.generation.next();
        state.generation = generation;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        state.active = Some(ActiveSession {
            generation,
            identifier: identifier.to_string(),
            status: UpstreamStatus::Idle,
            requester: requester.client_id(),
            started_at: Utc::now(),
            shutdown: shutdown_tx,
        });
        state.advance(generation, UpstreamStatus::Connecting);
        drop(state);

        tracing::info!(
            identifier,
            generation = %generation,
            client_id = %requester.client_id(),
            "Connecting to upstream live session"
        );

        let task = SessionTask {
            state: Arc::clone(&self.state),
            generation,
            identifier: identifier.to_string(),
            connection,
            requester,
            shutdown: shutdown_rx,
            announce_connected: self.announce_connected,
        };
        tokio::spawn(task.run());
    }

    /// Tear down the installed session, if any.
    ///
    /// Returns true if a session was cleared.
    pub async fn disconnect(&self) -> bool {
        let mut state = self.state.lock().await;
        match state.active.take() {
            Some(active) => {
                tracing::info!(
                    identifier = %active.identifier,
                    generation = %active.generation,
                    "Disconnecting upstream session"
                );
                active.teardown();
                true
            }
            None => false,
        }
    }

    /// Snapshot of the installed session.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.lock().await.active.as_ref().map(ActiveSession::snapshot)
    }

    /// Status of the installed session, `Idle` when none is installed.
    pub async fn status(&self) -> UpstreamStatus {
        self.state
            .lock()
            .await
            .active
            .as_ref()
            .map_or(UpstreamStatus::Idle, |active| active.status)
    }
}

/// Background task driving one upstream connection.
struct SessionTask {
    state: Arc<Mutex<ManagerState>>,
    generation: SessionGeneration,
    identifier: String,
    connection: Box<dyn LiveConnection>,
    requester: Arc<dyn ClientSink>,
    shutdown: watch::Receiver<bool>,
    announce_connected: bool,
}

impl SessionTask {
    async fn run(mut self) {
        let outcome = self.connection.connect().await;

        if !self.settle_connect(outcome).await {
            self.connection.disconnect().await;
            return;
        }

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.changed() => break,

                next = self.connection.next_event() => match next {
                    Some(Ok(event)) => self.forward(event),
                    Some(Err(e)) => {
                        tracing::warn!(
                            identifier = %self.identifier,
                            error = %e,
                            "Upstream stream error"
                        );
                    }
                    None => {
                        if self
                            .state
                            .lock()
                            .await
                            .advance(self.generation, UpstreamStatus::Disconnected)
                        {
                            tracing::info!(identifier = %self.identifier, "Upstream stream ended");
                        }
                        break;
                    }
                },
            }
        }

        self.connection.disconnect().await;
        tracing::debug!(
            identifier = %self.identifier,
            generation = %self.generation,
            "Upstream transport closed"
        );
    }

    /// Applies the connect result. Returns true if events should be relayed.
    async fn settle_connect(&mut self, outcome: Result<RoomInfo, SourceError>) -> bool {
        let mut state = self.state.lock().await;

        if !state.is_current(self.generation) {
            tracing::debug!(
                identifier = %self.identifier,
                generation = %self.generation,
                "Discarding connect result of replaced session"
            );
            return false;
        }

        match outcome {
            Ok(room) => {
                state.advance(self.generation, UpstreamStatus::Connected);
                tracing::info!(
                    identifier = %self.identifier,
                    room_id = %room.room_id,
                    "Connected to upstream room"
                );
                if self.announce_connected {
                    deliver(
                        self.requester.as_ref(),
                        NormalizedEvent::connected(&self.identifier, &room),
                    );
                }
                true
            }
            Err(e) => {
                state.advance(self.generation, UpstreamStatus::Failed);
                tracing::error!(
                    identifier = %self.identifier,
                    error = %e,
                    "Failed to connect to upstream live session"
                );
                deliver(
                    self.requester.as_ref(),
                    NormalizedEvent::connect_failed(&self.identifier),
                );
                false
            }
        }
    }

    fn forward(&self, event: LiveEvent) {
        let normalized = translate(event);
        tracing::debug!(kind = ?normalized.kind(), "{}", normalized.message());
        deliver(self.requester.as_ref(), normalized);
    }
}

/// Hand an event to a client, logging instead of failing when it is gone.
fn deliver(sink: &dyn ClientSink, event: NormalizedEvent) {
    if let Err(e) = sink.deliver(event) {
        tracing::debug!(client_id = %sink.client_id(), error = %e, "Dropping event");
    }
}
