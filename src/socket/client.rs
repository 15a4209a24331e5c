use crate::core::config::ChiefPayConfig;
use crate::core::endpoints::{Endpoint, API_VERSION};
use crate::core::errors::ChiefPayError;
use crate::core::kernel::{TungsteniteWs, WsConfig, WsSession};
use crate::core::types::{Notification, Rate};
use crate::socket::codec::{
    ChannelEvent, OpenPacket, SocketIoCodec, SocketIoCommand, SocketIoMessage,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tracing::{debug, info, instrument, warn};

pub type RatesCallback = Arc<dyn Fn(&[Rate]) + Send + Sync>;
pub type NotificationCallback = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// WebSocket URL of the event channel for an HTTP(S) base URL
pub fn socket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(host) = base.strip_prefix("https://") {
        format!("wss://{}", host)
    } else if let Some(host) = base.strip_prefix("http://") {
        format!("ws://{}", host)
    } else {
        base.to_string()
    };
    format!(
        "{}/{}{}/?EIO=4&transport=websocket",
        ws_base,
        API_VERSION,
        Endpoint::Socket.path()
    )
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Run a user handler; a panic is logged and the receive loop keeps going
fn invoke_handler(kind: &'static str, handler: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(handler)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        warn!(handler = kind, panic = %message, "Event handler panicked");
    }
}

/// State shared between the client handle and its receive loop
struct SharedState {
    state: RwLock<ConnectionState>,
    latest_rates: RwLock<Option<Vec<Rate>>>,
    on_rates: RwLock<Option<RatesCallback>>,
    on_notification: RwLock<Option<NotificationCallback>>,
}

impl SharedState {
    fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            latest_rates: RwLock::new(None),
            on_rates: RwLock::new(None),
            on_notification: RwLock::new(None),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *write(&self.state) = state;
    }

    fn dispatch(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Rates(rates) => {
                debug!(count = rates.len(), "Rates update received");
                *write(&self.latest_rates) = Some(rates.clone());
                let callback = read(&self.on_rates).clone();
                if let Some(callback) = callback {
                    invoke_handler("rates", || callback(&rates));
                }
            }
            ChannelEvent::Notification(notification) => {
                let callback = read(&self.on_notification).clone();
                match callback {
                    Some(callback) => {
                        invoke_handler("notification", || callback(&notification));
                    }
                    None => debug!("No notification handler registered, dropping notification"),
                }
            }
            ChannelEvent::Other { name, .. } => {
                debug!(event = %name, "Ignoring unknown channel event");
            }
        }
    }
}

struct Connection {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Asynchronous client for the real-time rates and notification channel
///
/// `connect` performs the handshake and spawns a receive loop on the current
/// Tokio runtime. Pushed `rates` replace the cached snapshot returned by
/// [`AsyncSocketClient::get_latest_rates`]; pushed notifications go to the
/// registered handler or are dropped.
///
/// # Example
/// ```rust,no_run
/// use chiefpay::{AsyncSocketClient, ChiefPayConfig};
///
/// # async fn example() -> Result<(), chiefpay::ChiefPayError> {
/// let socket = AsyncSocketClient::new(ChiefPayConfig::new("api-key"))?;
/// socket.set_on_notification(|n| println!("{:?}", n));
/// socket.connect().await?;
/// println!("{:?}", socket.get_latest_rates());
/// socket.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncSocketClient {
    url: String,
    api_key: HeaderValue,
    config: WsConfig,
    shared: Arc<SharedState>,
    connection: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for AsyncSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSocketClient")
            .field("url", &self.url)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl AsyncSocketClient {
    pub fn new(config: ChiefPayConfig) -> Result<Self, ChiefPayError> {
        Self::with_ws_config(config, WsConfig::default())
    }

    pub fn with_ws_config(config: ChiefPayConfig, ws_config: WsConfig) -> Result<Self, ChiefPayError> {
        let mut api_key = HeaderValue::from_str(config.api_key()).map_err(|_| {
            ChiefPayError::ConfigurationError(
                "API key contains characters not allowed in an HTTP header".to_string(),
            )
        })?;
        api_key.set_sensitive(true);

        Ok(Self {
            url: socket_url(&config.effective_base_url()),
            api_key,
            config: ws_config,
            shared: Arc::new(SharedState::new()),
            connection: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *read(&self.shared.state)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Open the channel and start receiving events
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn connect(&self) -> Result<(), ChiefPayError> {
        let mut connection = self.connection.lock().await;
        if let Some(active) = connection.as_ref() {
            if !active.task.is_finished() {
                return Err(ChiefPayError::ConnectionError(
                    "Already connected".to_string(),
                ));
            }
        }
        *connection = None;

        self.shared.set_state(ConnectionState::Connecting);
        *write(&self.shared.latest_rates) = None;

        let mut ws = TungsteniteWs::new(self.url.clone(), SocketIoCodec::new())
            .with_config(self.config.clone())
            .with_header(HeaderName::from_static("x-api-key"), self.api_key.clone());

        let open = match self.open_session(&mut ws).await {
            Ok(open) => open,
            Err(e) => {
                let _ = ws.close().await;
                self.shared.set_state(ConnectionState::Disconnected);
                warn!(error = %e, "Event stream connection failed");
                return Err(e);
            }
        };

        self.shared.set_state(ConnectionState::Connected);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(receive_loop(
            ws,
            Arc::clone(&self.shared),
            shutdown_rx,
            open.idle_timeout(),
        ));
        *connection = Some(Connection { shutdown, task });

        info!(sid = %open.sid, "Connected to event stream");
        Ok(())
    }

    async fn open_session<W>(&self, ws: &mut W) -> Result<OpenPacket, ChiefPayError>
    where
        W: WsSession<SocketIoCodec>,
    {
        ws.connect().await?;
        tokio::time::timeout(self.config.handshake_timeout(), handshake(ws))
            .await
            .map_err(|_| ChiefPayError::ConnectionError("Socket.IO handshake timeout".to_string()))?
    }

    /// Close the channel; a no-op when not connected
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn disconnect(&self) -> Result<(), ChiefPayError> {
        let Some(active) = self.connection.lock().await.take() else {
            return Ok(());
        };

        let _ = active.shutdown.send(());
        let joined = active.task.await;
        self.shared.set_state(ConnectionState::Disconnected);
        joined.map_err(|e| {
            ChiefPayError::ConnectionError(format!("Receive loop terminated abnormally: {}", e))
        })?;

        info!("Disconnected from event stream");
        Ok(())
    }

    /// Most recent rates pushed since the last `connect`
    pub fn get_latest_rates(&self) -> Option<Vec<Rate>> {
        read(&self.shared.latest_rates).clone()
    }

    /// Register the rates handler, replacing any previous one
    pub fn set_on_rates<F>(&self, callback: F)
    where
        F: Fn(&[Rate]) + Send + Sync + 'static,
    {
        *write(&self.shared.on_rates) = Some(Arc::new(callback));
    }

    /// Register the notification handler, replacing any previous one
    ///
    /// Notifications that arrive while no handler is registered are dropped.
    pub fn set_on_notification<F>(&self, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        *write(&self.shared.on_notification) = Some(Arc::new(callback));
    }

    pub fn clear_on_rates(&self) {
        *write(&self.shared.on_rates) = None;
    }

    pub fn clear_on_notification(&self) {
        *write(&self.shared.on_notification) = None;
    }
}

/// Wait for the Engine.IO open packet, then join the default namespace
async fn handshake<W>(ws: &mut W) -> Result<OpenPacket, ChiefPayError>
where
    W: WsSession<SocketIoCodec>,
{
    let open = loop {
        match next_handshake_packet(ws).await? {
            SocketIoMessage::Open(open) => break open,
            SocketIoMessage::Ping => ws.send(&SocketIoCommand::Pong).await?,
            other => debug!(?other, "Ignoring packet before open"),
        }
    };

    ws.send(&SocketIoCommand::Connect).await?;

    loop {
        match next_handshake_packet(ws).await? {
            SocketIoMessage::Connected { .. } => return Ok(open),
            SocketIoMessage::ConnectError(message) => {
                return Err(ChiefPayError::ConnectionError(format!(
                    "Server rejected the connection: {}",
                    message
                )))
            }
            SocketIoMessage::Ping => ws.send(&SocketIoCommand::Pong).await?,
            SocketIoMessage::Close | SocketIoMessage::Disconnected => {
                return Err(ChiefPayError::ConnectionError(
                    "Server closed the connection during handshake".to_string(),
                ))
            }
            other => debug!(?other, "Ignoring packet before namespace connect"),
        }
    }
}

async fn next_handshake_packet<W>(ws: &mut W) -> Result<SocketIoMessage, ChiefPayError>
where
    W: WsSession<SocketIoCodec>,
{
    match ws.next_message().await {
        Some(Ok(message)) => Ok(message),
        Some(Err(ChiefPayError::PayloadError(e))) => Err(ChiefPayError::ConnectionError(
            format!("Malformed handshake packet: {}", e),
        )),
        Some(Err(e)) => Err(e),
        None => Err(ChiefPayError::ConnectionError(
            "Connection closed during handshake".to_string(),
        )),
    }
}

async fn receive_loop<W>(
    mut ws: W,
    shared: Arc<SharedState>,
    mut shutdown: oneshot::Receiver<()>,
    idle_timeout: Duration,
) where
    W: WsSession<SocketIoCodec> + 'static,
{
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                if let Err(e) = ws.send(&SocketIoCommand::Disconnect).await {
                    debug!(error = %e, "Failed to send disconnect packet");
                }
                let _ = ws.close().await;
                break;
            }
            next = tokio::time::timeout(idle_timeout, ws.next_message()) => {
                match next {
                    Err(_) => {
                        warn!(timeout_ms = idle_timeout.as_millis() as u64, "Event stream idle timeout");
                        let _ = ws.close().await;
                        break;
                    }
                    Ok(None) => {
                        info!("Event stream closed by server");
                        break;
                    }
                    Ok(Some(Err(e))) => {
                        if ws.is_connected() {
                            warn!(error = %e, "Dropping malformed event-stream packet");
                        } else {
                            warn!(error = %e, "Event stream transport failed");
                            break;
                        }
                    }
                    Ok(Some(Ok(message))) => match message {
                        SocketIoMessage::Ping => {
                            if let Err(e) = ws.send(&SocketIoCommand::Pong).await {
                                warn!(error = %e, "Failed to answer ping");
                                break;
                            }
                        }
                        SocketIoMessage::Event(event) => shared.dispatch(event),
                        SocketIoMessage::Close | SocketIoMessage::Disconnected => {
                            info!("Server ended the event stream");
                            let _ = ws.close().await;
                            break;
                        }
                        other => debug!(?other, "Ignoring control packet"),
                    },
                }
            }
        }
    }

    shared.set_state(ConnectionState::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::rest::API_KEY_HEADER;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url("https://api.chiefpay.org"),
            "wss://api.chiefpay.org/v1/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("http://127.0.0.1:8080/"),
            "ws://127.0.0.1:8080/v1/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_dispatch_replaces_rates_and_calls_handler() {
        let shared = SharedState::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        *write(&shared.on_rates) = Some(Arc::new(move |rates: &[Rate]| {
            assert!(!rates.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let first = vec![Rate {
            name: "BTC".to_string(),
            rate: "1".to_string(),
        }];
        let second = vec![Rate {
            name: "ETH".to_string(),
            rate: "2".to_string(),
        }];
        shared.dispatch(ChannelEvent::Rates(first));
        shared.dispatch(ChannelEvent::Rates(second.clone()));

        assert_eq!(read(&shared.latest_rates).clone(), Some(second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispatch_drops_notification_without_handler() {
        let shared = SharedState::new();
        let notification: Notification = serde_json::from_value(json!({
            "type": "invoice",
            "invoice": {
                "id": "i", "orderId": "o", "description": "", "amount": "1",
                "payedAmount": "0", "feeIncluded": false, "accuracy": "0.01",
                "discount": "0", "feeRate": "0", "createdAt": "2024-01-01T00:00:00.000Z",
                "expiredAt": "2024-01-01T01:00:00.000Z", "status": "new", "addresses": []
            }
        }))
        .unwrap();

        shared.dispatch(ChannelEvent::Notification(notification.clone()));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        *write(&shared.on_notification) = Some(Arc::new(move |_: &Notification| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        shared.dispatch(ChannelEvent::Notification(notification));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_survives_panicking_handler() {
        let shared = SharedState::new();
        *write(&shared.on_rates) = Some(Arc::new(|_: &[Rate]| panic!("handler failure")));

        let first = vec![Rate {
            name: "BTC".to_string(),
            rate: "1".to_string(),
        }];
        shared.dispatch(ChannelEvent::Rates(first.clone()));
        assert_eq!(read(&shared.latest_rates).clone(), Some(first));

        *write(&shared.on_rates) = None;
        let second = vec![Rate {
            name: "ETH".to_string(),
            rate: "1".to_string(),
        }];
        shared.dispatch(ChannelEvent::Rates(second.clone()));
        assert_eq!(read(&shared.latest_rates).clone(), Some(second));
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = AsyncSocketClient::new(ChiefPayConfig::new("key")).unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.get_latest_rates().is_none());
    }

    #[test]
    fn test_invalid_api_key_header_is_rejected() {
        let result = AsyncSocketClient::new(ChiefPayConfig::new("bad\r\nkey"));
        assert!(matches!(result, Err(ChiefPayError::ConfigurationError(_))));
    }

    #[test]
    fn test_header_name_matches_rest_header() {
        assert!(API_KEY_HEADER.eq_ignore_ascii_case("x-api-key"));
    }
}
