//! Client hub - registry of attached WebSocket clients.
//!
//! Tracks every attached socket, routes connect requests to the session
//! manager, and tears the upstream session down when the last client leaves.
//!
//! # Delivery
//!
//! ```text
//!  client-a ──connect(alice)──► SessionManager ──events──► client-a
//!  client-b                     (single session)
//! ```
//!
//! Events are delivered only to the client whose request created the
//! session, never to every attached client. Each client has a bounded
//! outbox; events for a client that stops reading are dropped once it fills.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

use crate::application::SessionManager;
use crate::domain::foundation::ClientId;
use crate::domain::live::NormalizedEvent;
use crate::ports::{ClientSink, SinkError};

use super::messages::ClientMessage;

/// Outbox size used when none is configured.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// One attached client connection.
///
/// Holds the sending half of the client's outbound queue; the WebSocket
/// writer task owns the receiving half.
#[derive(Debug)]
pub struct ClientSocket {
    id: ClientId,
    outbox: mpsc::Sender<NormalizedEvent>,
    alive: AtomicBool,
}

impl ClientSocket {
    fn new(outbox: mpsc::Sender<NormalizedEvent>) -> Self {
        Self {
            id: ClientId::new(),
            outbox,
            alive: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// False once the client detached or its transport stopped reading.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.outbox.is_closed()
    }

    fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl ClientSink for ClientSocket {
    fn client_id(&self) -> ClientId {
        self.id
    }

    fn deliver(&self, event: NormalizedEvent) -> Result<(), SinkError> {
        if !self.alive.load(Ordering::Acquire) {
            return Err(SinkError::Closed(self.id));
        }
        match self.outbox.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SinkError::Backlogged(self.id)),
            Err(TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(SinkError::Closed(self.id))
            }
        }
    }
}

/// Registry of attached clients in front of the session manager.
pub struct ClientHub {
    clients: RwLock<HashMap<ClientId, Arc<ClientSocket>>>,
    sessions: Arc<SessionManager>,
    outbox_capacity: usize,
}

impl ClientHub {
    /// Create a hub that forwards connect requests to `sessions`.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            sessions,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }

    /// Number of undelivered events each client may have queued.
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity.max(1);
        self
    }

    /// The session manager behind this hub.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Register a newly connected client.
    ///
    /// Returns the client's socket and the receiver its writer task drains.
    /// Attaching has no effect on the upstream session.
    pub async fn attach(&self) -> (Arc<ClientSocket>, mpsc::Receiver<NormalizedEvent>) {
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        let socket = Arc::new(ClientSocket::new(tx));

        let mut clients = self.clients.write().await;
        clients.insert(socket.id(), Arc::clone(&socket));
        tracing::info!(
            client_id = %socket.id(),
            clients = clients.len(),
            "Client connected to WebSocket"
        );

        (socket, rx)
    }

    /// Handle one inbound text frame from `client_id`.
    ///
    /// Only connect requests with a non-empty username are acted on; every
    /// other frame is dropped without a reply. Returns true if a connect was
    /// forwarded to the session manager.
    pub async fn handle_text(&self, client_id: &ClientId, text: &str) -> bool {
        let Some(target) = ClientMessage::parse(text)
            .as_ref()
            .and_then(ClientMessage::connect_target)
            .map(str::to_string)
        else {
            tracing::trace!(client_id = %client_id, "Ignoring malformed client message");
            return false;
        };

        let Some(socket) = self.clients.read().await.get(client_id).cloned() else {
            tracing::trace!(client_id = %client_id, "Ignoring message from detached client");
            return false;
        };

        tracing::info!(client_id = %client_id, identifier = %target, "Connect requested");
        self.sessions.connect(&target, socket).await;
        true
    }

    /// Deregister a client. Tears down the upstream session when the last
    /// client leaves.
    ///
    /// Returns the number of clients still attached.
    pub async fn detach(&self, client_id: &ClientId) -> usize {
        let mut clients = self.clients.write().await;

        let Some(socket) = clients.remove(client_id) else {
            return clients.len();
        };
        socket.mark_dead();

        let remaining = clients.len();
        tracing::info!(
            client_id = %client_id,
            clients = remaining,
            "Client disconnected from WebSocket"
        );

        if remaining == 0 && self.sessions.disconnect().await {
            tracing::info!("No clients remaining, disconnected from upstream");
        }

        remaining
    }

    /// Number of attached clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether `client_id` is currently attached.
    pub async fn is_attached(&self, client_id: &ClientId) -> bool {
        self.clients.read().await.contains_key(client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::ScriptedSource;

    fn hub() -> ClientHub {
        let sessions = SessionManager::new(Arc::new(ScriptedSource::new()));
        ClientHub::new(Arc::new(sessions))
    }

    #[tokio::test]
    async fn attach_registers_client() {
        let hub = hub();
        let (socket, _rx) = hub.attach().await;

        assert_eq!(hub.client_count().await, 1);
        assert!(hub.is_attached(&socket.id()).await);
        assert!(socket.is_alive());
    }

    #[tokio::test]
    async fn attach_has_no_session_side_effects() {
        let hub = hub();
        let _client = hub.attach().await;

        assert!(hub.sessions().snapshot().await.is_none());
    }

    #[tokio::test]
    async fn detach_removes_client_and_reports_remaining() {
        let hub = hub();
        let (a, _rx_a) = hub.attach().await;
        let (b, _rx_b) = hub.attach().await;

        assert_eq!(hub.detach(&a.id()).await, 1);
        assert!(!a.is_alive());
        assert_eq!(hub.detach(&b.id()).await, 0);
        assert_eq!(hub.client_count().await, 0);
    }

    #[tokio::test]
    async fn detach_unknown_client_is_noop() {
        let hub = hub();
        let _client = hub.attach().await;

        assert_eq!(hub.detach(&ClientId::new()).await, 1);
    }

    #[tokio::test]
    async fn connect_request_installs_session() {
        let hub = hub();
        let (socket, _rx) = hub.attach().await;

        assert!(
            hub.handle_text(&socket.id(), r#"{"type":"connect","username":"alice"}"#)
                .await
        );

        let snapshot = hub.sessions().snapshot().await.unwrap();
        assert_eq!(snapshot.identifier, "alice");
        assert_eq!(snapshot.requester, socket.id());
    }

    #[tokio::test]
    async fn malformed_requests_are_dropped() {
        let hub = hub();
        let (socket, mut rx) = hub.attach().await;

        for frame in [
            "garbage",
            r#"{"type":"connect"}"#,
            r#"{"type":"connect","username":""}"#,
            r#"{"type":"join","username":"alice"}"#,
        ] {
            assert!(!hub.handle_text(&socket.id(), frame).await);
        }

        assert!(hub.sessions().snapshot().await.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn requests_from_detached_clients_are_dropped() {
        let hub = hub();
        let (socket, _rx) = hub.attach().await;
        let (_other, _rx_other) = hub.attach().await;
        hub.detach(&socket.id()).await;

        assert!(
            !hub.handle_text(&socket.id(), r#"{"type":"connect","username":"alice"}"#)
                .await
        );
        assert!(hub.sessions().snapshot().await.is_none());
    }

    #[tokio::test]
    async fn last_detach_clears_session() {
        let hub = hub();
        let (socket, _rx) = hub.attach().await;
        hub.handle_text(&socket.id(), r#"{"type":"connect","username":"alice"}"#)
            .await;

        hub.detach(&socket.id()).await;

        assert!(hub.sessions().snapshot().await.is_none());
    }

    #[tokio::test]
    async fn delivery_to_dead_socket_fails() {
        let hub = hub();
        let (socket, rx) = hub.attach().await;
        drop(rx);

        let result = socket.deliver(NormalizedEvent::internal_error());
        assert_eq!(result, Err(SinkError::Closed(socket.id())));
        assert!(!socket.is_alive());
    }

    #[tokio::test]
    async fn full_outbox_drops_events() {
        let hub = hub().with_outbox_capacity(2);
        let (socket, mut rx) = hub.attach().await;

        socket.deliver(NormalizedEvent::internal_error()).unwrap();
        socket.deliver(NormalizedEvent::internal_error()).unwrap();
        assert_eq!(
            socket.deliver(NormalizedEvent::internal_error()),
            Err(SinkError::Backlogged(socket.id()))
        );
        assert!(socket.is_alive());

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());

        // Draining frees room again
        assert!(socket.deliver(NormalizedEvent::internal_error()).is_ok());
    }

    #[tokio::test]
    async fn array_frame_opens_no_session() {
        let source = ScriptedSource::new();
        let hub = ClientHub::new(Arc::new(SessionManager::new(Arc::new(source.clone()))));
        let (socket, _rx) = hub.attach().await;

        assert!(!hub.handle_text(&socket.id(), r#"["connect","alice"]"#).await);

        assert!(source.stats().open_calls.is_empty());
        assert!(hub.sessions().snapshot().await.is_none());
    }

    #[tokio::test]
    async fn delivery_reaches_outbox() {
        let hub = hub();
        let (socket, mut rx) = hub.attach().await;

        socket.deliver(NormalizedEvent::internal_error()).unwrap();

        assert_eq!(rx.recv().await, Some(NormalizedEvent::internal_error()));
    }
}
