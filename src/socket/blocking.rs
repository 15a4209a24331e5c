use crate::core::config::ChiefPayConfig;
use crate::core::errors::ChiefPayError;
use crate::core::kernel::{BlockingRuntime, WsConfig};
use crate::core::types::{Notification, Rate};
use crate::socket::client::{AsyncSocketClient, ConnectionState};

/// Blocking variant of [`AsyncSocketClient`]
///
/// The receive loop runs on a one-worker runtime owned by this client, so
/// events keep arriving and handlers keep firing between calls.
#[derive(Debug)]
pub struct SocketClient {
    inner: AsyncSocketClient,
    runtime: BlockingRuntime,
}

impl SocketClient {
    pub fn new(config: ChiefPayConfig) -> Result<Self, ChiefPayError> {
        Self::with_ws_config(config, WsConfig::default())
    }

    pub fn with_ws_config(config: ChiefPayConfig, ws_config: WsConfig) -> Result<Self, ChiefPayError> {
        Ok(Self {
            inner: AsyncSocketClient::with_ws_config(config, ws_config)?,
            runtime: BlockingRuntime::background(1)?,
        })
    }

    pub fn connect(&self) -> Result<(), ChiefPayError> {
        self.runtime.block_on(self.inner.connect())
    }

    pub fn disconnect(&self) -> Result<(), ChiefPayError> {
        self.runtime.block_on(self.inner.disconnect())
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn get_latest_rates(&self) -> Option<Vec<Rate>> {
        self.inner.get_latest_rates()
    }

    pub fn set_on_rates<F>(&self, callback: F)
    where
        F: Fn(&[Rate]) + Send + Sync + 'static,
    {
        self.inner.set_on_rates(callback);
    }

    pub fn set_on_notification<F>(&self, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.inner.set_on_notification(callback);
    }

    pub fn clear_on_rates(&self) {
        self.inner.clear_on_rates();
    }

    pub fn clear_on_notification(&self) {
        self.inner.clear_on_notification();
    }

    pub fn url(&self) -> &str {
        self.inner.url()
    }
}
