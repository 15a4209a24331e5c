use crate::builder::ChiefPayBuilder;
use crate::client::{AsyncClient, Client};
use crate::core::config::ChiefPayConfig;
use crate::core::errors::ChiefPayError;
use crate::socket::{AsyncSocketClient, SocketClient};

/// REST and event-stream clients sharing one API key and base URL
#[derive(Debug)]
pub struct AsyncChiefPay {
    pub rest: AsyncClient,
    pub socket: AsyncSocketClient,
}

impl AsyncChiefPay {
    pub fn new(config: ChiefPayConfig) -> Result<Self, ChiefPayError> {
        ChiefPayBuilder::new().with_config(config).build_async()
    }

    /// Disconnect the event stream and release the HTTP session
    pub async fn close(self) -> Result<(), ChiefPayError> {
        let result = self.socket.disconnect().await;
        self.rest.close();
        result
    }
}

/// Blocking counterpart of [`AsyncChiefPay`]
#[derive(Debug)]
pub struct ChiefPay {
    pub rest: Client,
    pub socket: SocketClient,
}

impl ChiefPay {
    pub fn new(config: ChiefPayConfig) -> Result<Self, ChiefPayError> {
        ChiefPayBuilder::new().with_config(config).build()
    }

    pub fn close(self) -> Result<(), ChiefPayError> {
        let result = self.socket.disconnect();
        self.rest.close();
        result
    }
}
