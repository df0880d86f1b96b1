//! Scripted live source for tests and local demos.
//!
//! Provides a configurable in-memory implementation of the LiveEventSource
//! port, so the session lifecycle can be exercised without a real upstream.
//!
//! # Features
//!
//! - Queued per-connection outcomes (connect, fail, reject at open)
//! - A connect gate that holds connect attempts until released
//! - Event injection into any opened connection
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let source = ScriptedSource::new()
//!     .with_outcome(ScriptedOutcome::fail("offline"));
//!
//! let mut connection = source.open("alice")?;
//! assert!(connection.connect().await.is_err());
//! assert_eq!(source.stats().connect_attempts, 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Notify, Semaphore};

use crate::domain::live::{LiveEvent, RoomInfo};
use crate::ports::{EventStream, LiveConnection, LiveEventSource, SourceError};

/// What the next opened connection will do.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// `open` succeeds and `connect` reports this room.
    Connect(RoomInfo),
    /// `open` succeeds and `connect` fails with this error.
    Fail(SourceError),
    /// `open` itself fails with this error.
    RejectOpen(SourceError),
}

impl ScriptedOutcome {
    /// Successful connect to the given room.
    pub fn connect(room_id: impl Into<String>) -> Self {
        ScriptedOutcome::Connect(RoomInfo {
            room_id: room_id.into(),
        })
    }

    /// Upstream rejects the connect attempt.
    pub fn fail(reason: impl Into<String>) -> Self {
        ScriptedOutcome::Fail(SourceError::Rejected(reason.into()))
    }

    /// Construction fails before any I/O.
    pub fn reject_open(reason: impl Into<String>) -> Self {
        ScriptedOutcome::RejectOpen(SourceError::Protocol(reason.into()))
    }
}

/// Snapshot of the calls made against a [`ScriptedSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptStats {
    /// Every identifier passed to `open`, including rejected ones.
    pub open_calls: Vec<String>,
    /// Identifiers of connections actually created, by connection index.
    pub opened: Vec<String>,
    pub connect_attempts: usize,
    pub disconnects: usize,
}

impl ScriptStats {
    /// Connections created and not yet closed.
    pub fn live_connections(&self) -> usize {
        self.opened.len().saturating_sub(self.disconnects)
    }
}

#[derive(Default)]
struct ScriptState {
    outcomes: VecDeque<ScriptedOutcome>,
    stats: ScriptStats,
    feeds: Vec<Option<mpsc::UnboundedSender<LiveEvent>>>,
}

/// In-memory live source driven by the test.
#[derive(Clone)]
pub struct ScriptedSource {
    state: Arc<Mutex<ScriptState>>,
    changed: Arc<Notify>,
    gate: Option<Arc<Semaphore>>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    /// Creates a source whose connections all succeed immediately.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState::default())),
            changed: Arc::new(Notify::new()),
            gate: None,
        }
    }

    /// Queues the outcome for the next `open` call.
    ///
    /// When the queue is empty, connections succeed with a generated room id.
    pub fn with_outcome(self, outcome: ScriptedOutcome) -> Self {
        self.lock().outcomes.push_back(outcome);
        self
    }

    /// Holds every connect attempt until [`release_connects`](Self::release_connects).
    pub fn hold_connects(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `count` held connect attempts complete.
    pub fn release_connects(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Returns a snapshot of recorded calls.
    pub fn stats(&self) -> ScriptStats {
        self.lock().stats.clone()
    }

    /// Pushes an event into connection `index` (in open order).
    ///
    /// Returns false if the connection does not exist or its stream ended.
    pub fn emit(&self, index: usize, event: LiveEvent) -> bool {
        let state = self.lock();
        match state.feeds.get(index) {
            Some(Some(feed)) => feed.send(event).is_ok(),
            _ => false,
        }
    }

    /// Pushes an event into the most recently opened connection.
    pub fn emit_latest(&self, event: LiveEvent) -> bool {
        let latest = self.lock().feeds.len().checked_sub(1);
        match latest {
            Some(index) => self.emit(index, event),
            None => false,
        }
    }

    /// Ends the event stream of connection `index`, as a broadcast ending would.
    pub fn end_stream(&self, index: usize) {
        if let Some(feed) = self.lock().feeds.get_mut(index) {
            feed.take();
        }
    }

    /// Waits until the recorded calls satisfy `predicate`.
    ///
    /// Returns false if `within` elapses first.
    pub async fn wait_until(
        &self,
        within: Duration,
        predicate: impl Fn(&ScriptStats) -> bool,
    ) -> bool {
        tokio::time::timeout(within, async {
            loop {
                let notified = self.changed.notified();
                if predicate(&self.stats()) {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, update: impl FnOnce(&mut ScriptStats)) {
        update(&mut self.lock().stats);
        self.changed.notify_waiters();
    }
}

impl LiveEventSource for ScriptedSource {
    fn open(&self, identifier: &str) -> Result<Box<dyn LiveConnection>, SourceError> {
        let mut state = self.lock();
        state.stats.open_calls.push(identifier.to_string());

        let index = state.feeds.len();
        let outcome = state
            .outcomes
            .pop_front()
            .unwrap_or_else(|| ScriptedOutcome::connect(format!("room-{}", index)));

        let result = match outcome {
            ScriptedOutcome::RejectOpen(err) => Err(err),
            ScriptedOutcome::Connect(room) => Ok(Ok(room)),
            ScriptedOutcome::Fail(err) => Ok(Err(err)),
        };

        let connection: Result<Box<dyn LiveConnection>, SourceError> = match result {
            Err(err) => Err(err),
            Ok(connect_result) => {
                let (tx, rx) = mpsc::unbounded_channel();
                state.feeds.push(Some(tx));
                state.stats.opened.push(identifier.to_string());
                Ok(Box::new(ScriptedConnection {
                    source: self.clone(),
                    connect_result: Some(connect_result),
                    events: rx,
                    closed: false,
                }))
            }
        };
        drop(state);
        self.changed.notify_waiters();
        connection
    }
}

/// Connection handed out by [`ScriptedSource`].
struct ScriptedConnection {
    source: ScriptedSource,
    connect_result: Option<Result<RoomInfo, SourceError>>,
    events: mpsc::UnboundedReceiver<LiveEvent>,
    closed: bool,
}

#[async_trait]
impl LiveConnection for ScriptedConnection {
    async fn connect(&mut self) -> Result<RoomInfo, SourceError> {
        self.source.record(|stats| stats.connect_attempts += 1);

        if let Some(gate) = &self.source.gate {
            gate.acquire()
                .await
                .map_err(|_| SourceError::Closed)?
                .forget();
        }

        self.connect_result.take().unwrap_or(Err(SourceError::Closed))
    }

    async fn next_event(&mut self) -> EventStream {
        if self.closed {
            return None;
        }
        self.events.recv().await.map(Ok)
    }

    async fn disconnect(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events.close();
            self.source.record(|stats| stats.disconnects += 1);
        }
    }
}
