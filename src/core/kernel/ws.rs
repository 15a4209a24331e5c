use crate::core::errors::ChiefPayError;
use crate::core::kernel::codec::WsCodec;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{instrument, trace, warn};

/// WebSocket transport configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// TCP + TLS + upgrade timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Protocol-level handshake timeout in milliseconds, applied after the upgrade
    pub handshake_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            handshake_timeout_ms: 10_000,
        }
    }
}

impl WsConfig {
    pub fn with_connect_timeout(mut self, connect_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self
    }

    pub fn with_handshake_timeout(mut self, handshake_timeout_ms: u64) -> Self {
        self.handshake_timeout_ms = handshake_timeout_ms;
        self
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// WebSocket session trait - pure transport layer
#[async_trait]
pub trait WsSession<C: WsCodec>: Send + Sync {
    /// Connect to the WebSocket
    async fn connect(&mut self) -> Result<(), ChiefPayError>;

    /// Send a raw message
    async fn send_raw(&mut self, msg: Message) -> Result<(), ChiefPayError>;

    /// Receive the next raw data message
    async fn next_raw(&mut self) -> Option<Result<Message, ChiefPayError>>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), ChiefPayError>;

    /// Check if the connection is alive
    fn is_connected(&self) -> bool;

    /// Encode and send a command using the codec
    async fn send(&mut self, command: &C::Command) -> Result<(), ChiefPayError>;

    /// Get the next decoded message
    async fn next_message(&mut self) -> Option<Result<C::Message, ChiefPayError>>;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Tungstenite-based WebSocket implementation
pub struct TungsteniteWs<C: WsCodec> {
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    write: Option<futures_util::stream::SplitSink<WsStream, Message>>,
    read: Option<futures_util::stream::SplitStream<WsStream>>,
    connected: bool,
    codec: C,
    config: WsConfig,
}

impl<C: WsCodec> TungsteniteWs<C> {
    /// Create a new WebSocket session with the specified codec
    ///
    /// # Arguments
    /// * `url` - The WebSocket URL to connect to
    /// * `codec` - The codec to handle message encoding/decoding
    pub fn new(url: String, codec: C) -> Self {
        Self {
            url,
            headers: Vec::new(),
            write: None,
            read: None,
            connected: false,
            codec,
            config: WsConfig::default(),
        }
    }

    /// Set custom WebSocket configuration
    pub fn with_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a header to the upgrade request
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<C: WsCodec> WsSession<C> for TungsteniteWs<C> {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&mut self) -> Result<(), ChiefPayError> {
        let mut request = self.url.as_str().into_client_request().map_err(|e| {
            ChiefPayError::ConnectionError(format!("Invalid WebSocket URL {}: {}", self.url, e))
        })?;
        for (name, value) in &self.headers {
            request.headers_mut().insert(name.clone(), value.clone());
        }

        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                ChiefPayError::ConnectionError("WebSocket connection timeout".to_string())
            })?
            .map_err(|e| {
                ChiefPayError::ConnectionError(format!("WebSocket connection failed: {}", e))
            })?;

        let (write, read) = ws_stream.split();
        self.write = Some(write);
        self.read = Some(read);
        self.connected = true;

        Ok(())
    }

    #[instrument(skip(self, msg))]
    async fn send_raw(&mut self, msg: Message) -> Result<(), ChiefPayError> {
        if !self.connected {
            return Err(ChiefPayError::ConnectionError(
                "WebSocket not connected".to_string(),
            ));
        }

        let write = self.write.as_mut().ok_or_else(|| {
            ChiefPayError::ConnectionError("WebSocket write stream not available".to_string())
        })?;

        write.send(msg).await.map_err(|e| {
            self.connected = false;
            ChiefPayError::ConnectionError(format!("Failed to send WebSocket message: {}", e))
        })?;

        Ok(())
    }

    async fn next_raw(&mut self) -> Option<Result<Message, ChiefPayError>> {
        if !self.connected {
            return Some(Err(ChiefPayError::ConnectionError(
                "WebSocket not connected".to_string(),
            )));
        }

        loop {
            let read = self.read.as_mut()?;

            match read.next().await {
                Some(Ok(message)) => match message {
                    Message::Close(frame) => {
                        trace!(?frame, "WebSocket closed by peer");
                        self.connected = false;
                        return None;
                    }
                    Message::Ping(data) => {
                        if let Err(e) = self.send_raw(Message::Pong(data)).await {
                            warn!("Failed to send pong response: {}", e);
                        }
                    }
                    Message::Pong(_) | Message::Frame(_) => {}
                    _ => return Some(Ok(message)),
                },
                Some(Err(e)) => {
                    self.connected = false;
                    return Some(Err(ChiefPayError::ConnectionError(format!(
                        "WebSocket error: {}",
                        e
                    ))));
                }
                None => {
                    self.connected = false;
                    return None;
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn close(&mut self) -> Result<(), ChiefPayError> {
        if let Some(write) = self.write.as_mut() {
            let _ = write.send(Message::Close(None)).await;
        }
        self.connected = false;
        self.write = None;
        self.read = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, command: &C::Command) -> Result<(), ChiefPayError> {
        let message = self.codec.encode_command(command)?;
        self.send_raw(message).await
    }

    async fn next_message(&mut self) -> Option<Result<C::Message, ChiefPayError>> {
        loop {
            match self.next_raw().await? {
                Ok(raw_msg) => match self.codec.decode_message(raw_msg) {
                    Ok(Some(decoded)) => return Some(Ok(decoded)),
                    Ok(None) => {}
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
