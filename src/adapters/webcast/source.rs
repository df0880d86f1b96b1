//! Webcast live source - thin client over `tokio-tungstenite`.
//!
//! Connects to a webcast bridge at `{endpoint}/{handle}` and reads the
//! tagged JSON frames described in [`super::frames`]. A connect attempt
//! succeeds once the bridge reports the room id.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::UpstreamConfig;
use crate::domain::live::{RoomInfo, StreamerHandle};
use crate::ports::{EventStream, LiveConnection, LiveEventSource, SourceError};

use super::frames::WebcastFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live source backed by a webcast bridge.
#[derive(Debug, Clone)]
pub struct WebcastSource {
    endpoint: String,
    connect_timeout: Duration,
    process_initial_data: bool,
}

impl WebcastSource {
    /// Create a source for the bridge at `endpoint` (a `ws://` or `wss://` URL).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
            process_initial_data: false,
        }
    }

    /// Create a source from the upstream configuration section.
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.endpoint.clone())
            .with_connect_timeout(config.connect_timeout())
            .with_initial_data(config.process_initial_data)
    }

    /// Bound on the whole connect attempt (TCP, handshake, room confirmation).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Ask the bridge to replay events from before the connect.
    pub fn with_initial_data(mut self, enabled: bool) -> Self {
        self.process_initial_data = enabled;
        self
    }

    /// URL of the room stream for `handle`.
    pub fn room_url(&self, handle: &StreamerHandle) -> String {
        format!(
            "{}/{}?processInitialData={}",
            self.endpoint.trim_end_matches('/'),
            handle,
            self.process_initial_data
        )
    }
}

impl LiveEventSource for WebcastSource {
    fn open(&self, identifier: &str) -> Result<Box<dyn LiveConnection>, SourceError> {
        let handle =
            StreamerHandle::parse(identifier).map_err(|e| SourceError::InvalidIdentifier {
                identifier: identifier.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(WebcastConnection {
            url: self.room_url(&handle),
            connect_timeout: self.connect_timeout,
            stream: None,
        }))
    }
}

/// One connection to a webcast room stream.
struct WebcastConnection {
    url: String,
    connect_timeout: Duration,
    stream: Option<WsStream>,
}

impl WebcastConnection {
    /// Open the socket and wait for the room confirmation frame.
    async fn handshake(&mut self) -> Result<RoomInfo, SourceError> {
        let (mut ws, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;

        loop {
            let frame = match ws.next().await {
                Some(Ok(Message::Text(text))) => WebcastFrame::parse(&text)?,
                Some(Ok(Message::Close(_))) | None => return Err(SourceError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SourceError::Unreachable(e.to_string())),
            };

            match frame {
                WebcastFrame::Connected(room) => {
                    self.stream = Some(ws);
                    return Ok(room);
                }
                WebcastFrame::Error { message } => {
                    let _ = ws.close(None).await;
                    return Err(SourceError::Rejected(message));
                }
                WebcastFrame::StreamEnd => {
                    let _ = ws.close(None).await;
                    return Err(SourceError::Rejected("stream is not live".to_string()));
                }
                // Nothing is relayed before the room is confirmed
                _ => continue,
            }
        }
    }
}

#[async_trait]
impl LiveConnection for WebcastConnection {
    async fn connect(&mut self) -> Result<RoomInfo, SourceError> {
        tracing::debug!(url = %self.url, "Opening webcast stream");

        tokio::time::timeout(self.connect_timeout, self.handshake())
            .await
            .map_err(|_| SourceError::Timeout {
                secs: self.connect_timeout.as_secs(),
            })?
    }

    async fn next_event(&mut self) -> EventStream {
        let ws = self.stream.as_mut()?;

        loop {
            match ws.next().await? {
                Ok(Message::Text(text)) => match WebcastFrame::parse(&text) {
                    Ok(WebcastFrame::StreamEnd) => return None,
                    Ok(frame) => {
                        if let Some(event) = frame.into_event() {
                            return Some(Ok(event));
                        }
                    }
                    Err(e) => return Some(Err(e)),
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.stream = None;
                    return Some(Err(SourceError::Unreachable(e.to_string())));
                }
            }
        }
    }

    async fn disconnect(&mut self) {
        if let Some(mut ws) = self.stream.take() {
            if let Err(e) = ws.close(None).await {
                tracing::debug!(url = %self.url, "Error closing webcast stream: {}", e);
            }
        }
    }
}
