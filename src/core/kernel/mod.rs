/// Transport kernel shared by the REST and event-stream clients
///
/// The kernel contains no ChiefPay-specific request logic:
///
/// - `RestClient` / `ReqwestRest`: one pooled HTTP session, the `data`
///   envelope and the bounded 429 retry
/// - `WsSession` / `TungsteniteWs`: WebSocket connection management
/// - `WsCodec`: framing spoken on top of the WebSocket
/// - `BlockingRuntime`: drives the async pipeline from blocking code
///
/// # Example
/// ```rust,no_run
/// use chiefpay::core::endpoints::Endpoint;
/// use chiefpay::core::kernel::*;
/// use chiefpay::core::types::Rate;
/// use secrecy::Secret;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     "https://api.chiefpay.org".to_string(),
/// ))
/// .with_api_key(Secret::new("api-key".to_string()))
/// .build()?;
///
/// let rates: Vec<Rate> = rest.get_json(Endpoint::Rates, &[]).await?;
/// # Ok(())
/// # }
/// ```
pub mod blocking;
pub mod codec;
pub mod rest;
pub mod ws;

pub use blocking::BlockingRuntime;
pub use codec::WsCodec;
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use ws::{TungsteniteWs, WsConfig, WsSession};
