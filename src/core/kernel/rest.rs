use crate::core::endpoints::Endpoint;
use crate::core::errors::ChiefPayError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, trace, warn};

/// Header carrying the API key on every call
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Server hint on how long to wait after a 429, in milliseconds
pub const RETRY_AFTER_MS_HEADER: &str = "Retry-After-ms";

/// REST client trait for the ChiefPay API
///
/// Implementations only need to provide [`RestClient::request`]; the verb and
/// typed helpers are layered on top of it. Every successful call yields the
/// unwrapped `data` member of the response envelope.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Send one logical request and return the envelope's `data` value
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - Logical endpoint, resolved against the configured base URL
    /// * `query_params` - Query parameters as key-value pairs
    /// * `body` - Optional JSON body
    async fn request(
        &self,
        method: Method,
        endpoint: Endpoint,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ChiefPayError>;

    /// Make a GET request
    async fn get(
        &self,
        endpoint: Endpoint,
        query_params: &[(&str, &str)],
    ) -> Result<Value, ChiefPayError> {
        self.request(Method::GET, endpoint, query_params, None)
            .await
    }

    /// Make a GET request with strongly-typed response
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query_params: &[(&str, &str)],
    ) -> Result<T, ChiefPayError> {
        let data = self.get(endpoint, query_params).await?;
        decode_payload(endpoint, data)
    }

    /// Make a POST request with a JSON body
    async fn post(&self, endpoint: Endpoint, body: &Value) -> Result<Value, ChiefPayError> {
        self.request(Method::POST, endpoint, &[], Some(body)).await
    }

    /// Make a POST request with strongly-typed response
    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &Value,
    ) -> Result<T, ChiefPayError> {
        let data = self.post(endpoint, body).await?;
        decode_payload(endpoint, data)
    }
}

/// Map an unwrapped `data` value into a DTO
pub fn decode_payload<T: DeserializeOwned>(
    endpoint: Endpoint,
    data: Value,
) -> Result<T, ChiefPayError> {
    serde_json::from_value(data).map_err(|e| {
        ChiefPayError::PayloadError(format!("Failed to map {} response: {}", endpoint, e))
    })
}

/// Parse a 2xx body and extract the `data` member of the envelope
pub fn unwrap_envelope(body: &str) -> Result<Value, ChiefPayError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ChiefPayError::PayloadError(format!("Failed to parse JSON response: {}", e))
    })?;

    match value {
        Value::Object(mut envelope) => envelope.remove("data").ok_or_else(|| {
            ChiefPayError::PayloadError("Response envelope has no `data` field".to_string())
        }),
        other => Err(ChiefPayError::PayloadError(format!(
            "Expected a JSON object envelope, got: {}",
            other
        ))),
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API, without the version prefix
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// TCP/TLS connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts when the server answers 429
    pub max_retries: u32,
    /// Backoff used when a 429 carries no `Retry-After-ms` header
    pub default_retry_after_ms: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            max_retries: 3,
            default_retry_after_ms: 3_000,
            user_agent: concat!("chiefpay-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, connect_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self
    }

    /// Set the maximum number of attempts on rate limiting
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the fallback 429 backoff
    pub fn with_default_retry_after(mut self, retry_after_ms: u64) -> Self {
        self.default_retry_after_ms = retry_after_ms;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    api_key: Option<Secret<String>>,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            api_key: None,
        }
    }

    /// Set the API key sent as `X-Api-Key`
    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Build the REST client
    ///
    /// The session (connection pool and default headers) is created here once
    /// and reused by every request.
    pub fn build(self) -> Result<ReqwestRest, ChiefPayError> {
        let api_key = self.api_key.ok_or_else(|| {
            ChiefPayError::ConfigurationError("An API key is required".to_string())
        })?;

        let mut key_value = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            ChiefPayError::ConfigurationError(
                "API key contains characters not allowed in an HTTP header".to_string(),
            )
        })?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("x-api-key"), key_value);

        let client = Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .connect_timeout(Duration::from_millis(self.config.connect_timeout_ms))
            .user_agent(&self.config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ChiefPayError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Backoff requested by a 429 response
    fn retry_after(&self, headers: &HeaderMap) -> Duration {
        parse_retry_after_ms(headers)
            .unwrap_or_else(|| Duration::from_millis(self.config.default_retry_after_ms))
    }

    /// Handle the response and extract the envelope payload
    #[instrument(skip(self, response), fields(status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ChiefPayError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ChiefPayError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        if status.is_success() {
            unwrap_envelope(&response_text)
        } else {
            Err(ChiefPayError::HttpError {
                status: status.as_u16(),
                body: response_text,
            })
        }
    }
}

/// Read `Retry-After-ms`; `None` when absent or not a number
pub fn parse_retry_after_ms(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER_MS_HEADER)?.to_str().ok()?.trim();
    raw.parse::<u64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .map(|ms| ms.ceil() as u64)
        })
        .map(Duration::from_millis)
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params, body), fields(method = %method, endpoint = %endpoint))]
    async fn request(
        &self,
        method: Method,
        endpoint: Endpoint,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ChiefPayError> {
        let url = endpoint.url(&self.config.base_url);
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.client.request(method.clone(), &url);
            if !query_params.is_empty() {
                request = request.query(query_params);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ChiefPayError::NetworkError(format!("Request failed: {}", e)))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return self.handle_response(response).await;
            }

            if attempt >= max_attempts {
                warn!(attempt, "Rate limit retry budget exhausted");
                return Err(ChiefPayError::RateLimitError { attempts: attempt });
            }

            let delay = self.retry_after(response.headers());
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Rate limited, backing off before retry"
            );
            sleep(delay).await;
            debug!(attempt = attempt + 1, "Retrying request");
        }
    }
}
