use crate::client::{AsyncClient, Client};
use crate::core::config::ChiefPayConfig;
use crate::core::errors::ChiefPayError;
use crate::core::kernel::{RestClientBuilder, RestClientConfig, WsConfig};
use crate::facade::{AsyncChiefPay, ChiefPay};
use crate::socket::{AsyncSocketClient, SocketClient};
use std::time::Duration;

/// Builder for ChiefPay clients
///
/// Fluent interface for configuring transports once and building any of the
/// REST clients, event-stream clients or facades from the same settings.
///
/// # Example
/// ```rust,no_run
/// use chiefpay::ChiefPayBuilder;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), chiefpay::ChiefPayError> {
/// let chiefpay = ChiefPayBuilder::new()
///     .with_api_key("api-key")
///     .with_rest_timeout(Duration::from_secs(10))
///     .with_max_retries(5)
///     .build_async()?;
///
/// let rates = chiefpay.rest.get_rates().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChiefPayBuilder {
    config: ChiefPayConfig,
    rest_timeout: Duration,
    connect_timeout: Duration,
    max_retries: u32,
    default_retry_after: Duration,
    user_agent: Option<String>,
    ws_config: WsConfig,
}

impl Default for ChiefPayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChiefPayBuilder {
    /// Create a new `ChiefPayBuilder` with default settings
    pub fn new() -> Self {
        Self {
            config: ChiefPayConfig::new(String::new()),
            rest_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            default_retry_after: Duration::from_millis(3_000),
            user_agent: None,
            ws_config: WsConfig::default(),
        }
    }

    /// Set the whole client configuration
    pub fn with_config(mut self, config: ChiefPayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API key, keeping any configured base URL
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let base_url = self.config.base_url.take();
        self.config = ChiefPayConfig::new(api_key);
        self.config.base_url = base_url;
        self
    }

    /// Set base URL for the REST API and event stream
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Set REST request timeout
    pub fn with_rest_timeout(mut self, timeout: Duration) -> Self {
        self.rest_timeout = timeout;
        self
    }

    /// Set REST connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the total number of attempts made when rate limited
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff used when a 429 has no `Retry-After-ms` header
    pub fn with_default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set WebSocket connect timeout
    pub fn with_ws_connect_timeout(mut self, timeout: Duration) -> Self {
        self.ws_config.connect_timeout_ms = duration_millis(timeout);
        self
    }

    /// Set Socket.IO handshake timeout
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.ws_config.handshake_timeout_ms = duration_millis(timeout);
        self
    }

    fn ensure_api_key(&self) -> Result<(), ChiefPayError> {
        if self.config.api_key().trim().is_empty() {
            return Err(ChiefPayError::ConfigurationError(
                "An API key is required".to_string(),
            ));
        }
        Ok(())
    }

    fn rest_config(&self) -> RestClientConfig {
        let mut rest_config = RestClientConfig::new(self.config.effective_base_url())
            .with_timeout(duration_millis(self.rest_timeout).max(1))
            .with_connect_timeout(duration_millis(self.connect_timeout).max(1))
            .with_max_retries(self.max_retries)
            .with_default_retry_after(duration_millis(self.default_retry_after));
        if let Some(user_agent) = &self.user_agent {
            rest_config = rest_config.with_user_agent(user_agent.clone());
        }
        rest_config
    }

    /// Build an asynchronous REST client
    pub fn build_async_client(&self) -> Result<AsyncClient, ChiefPayError> {
        self.ensure_api_key()?;
        let rest = RestClientBuilder::new(self.rest_config())
            .with_api_key(self.config.api_key.clone())
            .build()?;
        Ok(AsyncClient::with_rest(rest))
    }

    /// Build a blocking REST client
    pub fn build_client(&self) -> Result<Client, ChiefPayError> {
        Client::with_async(self.build_async_client()?)
    }

    /// Build an asynchronous event-stream client
    pub fn build_async_socket(&self) -> Result<AsyncSocketClient, ChiefPayError> {
        self.ensure_api_key()?;
        AsyncSocketClient::with_ws_config(self.config.clone(), self.ws_config.clone())
    }

    /// Build a blocking event-stream client
    pub fn build_socket(&self) -> Result<SocketClient, ChiefPayError> {
        self.ensure_api_key()?;
        SocketClient::with_ws_config(self.config.clone(), self.ws_config.clone())
    }

    /// Build the asynchronous facade
    pub fn build_async(&self) -> Result<AsyncChiefPay, ChiefPayError> {
        Ok(AsyncChiefPay {
            rest: self.build_async_client()?,
            socket: self.build_async_socket()?,
        })
    }

    /// Build the blocking facade
    pub fn build(&self) -> Result<ChiefPay, ChiefPayError> {
        Ok(ChiefPay {
            rest: self.build_client()?,
            socket: self.build_socket()?,
        })
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
