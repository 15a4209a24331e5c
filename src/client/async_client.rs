use crate::builder::ChiefPayBuilder;
use crate::core::config::ChiefPayConfig;
use crate::core::endpoints::Endpoint;
use crate::core::errors::ChiefPayError;
use crate::core::kernel::{ReqwestRest, RestClient};
use crate::core::types::{
    CreateInvoiceRequest, CreateWalletRequest, Invoice, InvoicesHistory, Rate,
    TransactionsHistory, Wallet, DEFAULT_PAGE_LIMIT,
};
use crate::core::validation::{lookup_params, validate_date, validate_limit};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

/// Asynchronous ChiefPay REST client
///
/// Thin typed wrapper around a [`RestClient`]; every method validates its
/// arguments before any request is sent and returns the mapped DTO.
///
/// # Example
/// ```rust,no_run
/// use chiefpay::{AsyncClient, ChiefPayConfig};
///
/// # async fn example() -> Result<(), chiefpay::ChiefPayError> {
/// let client = AsyncClient::new(ChiefPayConfig::new("api-key"))?;
/// for rate in client.get_rates().await? {
///     println!("{}: {}", rate.name, rate.rate);
/// }
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncClient<R: RestClient = ReqwestRest> {
    rest: R,
}

impl AsyncClient {
    /// Create a client with default transport settings
    pub fn new(config: ChiefPayConfig) -> Result<Self, ChiefPayError> {
        ChiefPayBuilder::new().with_config(config).build_async_client()
    }
}

impl<R: RestClient> AsyncClient<R> {
    /// Wrap an already configured transport
    pub fn with_rest(rest: R) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &R {
        &self.rest
    }

    /// Current exchange rates
    #[instrument(skip(self))]
    pub async fn get_rates(&self) -> Result<Vec<Rate>, ChiefPayError> {
        self.rest.get_json(Endpoint::Rates, &[]).await
    }

    /// Look up an invoice by id, order id, or both
    #[instrument(skip(self))]
    pub async fn get_invoice(
        &self,
        id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<Invoice, ChiefPayError> {
        let params = lookup_params(id, order_id)?;
        self.rest.get_json(Endpoint::Invoice, &params).await
    }

    /// Look up a wallet by id, order id, or both
    #[instrument(skip(self))]
    pub async fn get_wallet(
        &self,
        id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<Wallet, ChiefPayError> {
        let params = lookup_params(id, order_id)?;
        self.rest.get_json(Endpoint::Wallet, &params).await
    }

    /// One page of invoices, newest first
    ///
    /// `limit` defaults to [`DEFAULT_PAGE_LIMIT`].
    #[instrument(skip(self))]
    pub async fn get_invoices(
        &self,
        from_date: &str,
        to_date: Option<&str>,
        limit: Option<u32>,
    ) -> Result<InvoicesHistory, ChiefPayError> {
        self.history(Endpoint::InvoicesHistory, from_date, to_date, limit)
            .await
    }

    /// One page of transactions, newest first
    ///
    /// `limit` defaults to [`DEFAULT_PAGE_LIMIT`].
    #[instrument(skip(self))]
    pub async fn get_transactions(
        &self,
        from_date: &str,
        to_date: Option<&str>,
        limit: Option<u32>,
    ) -> Result<TransactionsHistory, ChiefPayError> {
        self.history(Endpoint::TransactionsHistory, from_date, to_date, limit)
            .await
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_invoice(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<Invoice, ChiefPayError> {
        let body = to_body(request)?;
        self.rest.post_json(Endpoint::Invoice, &body).await
    }

    #[instrument(skip(self))]
    pub async fn create_wallet(&self, order_id: &str) -> Result<Wallet, ChiefPayError> {
        let body = to_body(&CreateWalletRequest {
            order_id: order_id.to_string(),
        })?;
        self.rest.post_json(Endpoint::Wallet, &body).await
    }

    /// Release the HTTP session
    pub fn close(self) {
        debug!("Closing REST client");
    }

    async fn history<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        from_date: &str,
        to_date: Option<&str>,
        limit: Option<u32>,
    ) -> Result<T, ChiefPayError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        validate_date("from_date", from_date)?;
        if let Some(to_date) = to_date {
            validate_date("to_date", to_date)?;
        }
        validate_limit(limit)?;

        let limit = limit.to_string();
        let mut params = vec![("fromDate", from_date), ("limit", limit.as_str())];
        if let Some(to_date) = to_date {
            params.push(("toDate", to_date));
        }

        self.rest.get_json(endpoint, &params).await
    }
}

fn to_body<T: serde::Serialize>(request: &T) -> Result<Value, ChiefPayError> {
    serde_json::to_value(request).map_err(|e| {
        ChiefPayError::PayloadError(format!("Failed to encode request body: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Mutex;

    type Recorded = (Method, Endpoint, Vec<(String, String)>, Option<Value>);

    /// Records every call and answers with a canned `data` value
    struct RecordingRest {
        calls: Mutex<Vec<Recorded>>,
        reply: Value,
    }

    impl RecordingRest {
        fn new(reply: Value) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RestClient for RecordingRest {
        async fn request(
            &self,
            method: Method,
            endpoint: Endpoint,
            query_params: &[(&str, &str)],
            body: Option<&Value>,
        ) -> Result<Value, ChiefPayError> {
            self.calls.lock().unwrap().push((
                method,
                endpoint,
                query_params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                body.cloned(),
            ));
            Ok(self.reply.clone())
        }
    }

    fn wallet_json() -> Value {
        json!({"id": "w-1", "orderId": "o-1", "addresses": []})
    }

    #[tokio::test]
    async fn test_lookup_without_keys_makes_no_request() {
        let client = AsyncClient::with_rest(RecordingRest::new(wallet_json()));

        let err = client.get_wallet(None, None).await.unwrap_err();
        assert!(matches!(err, ChiefPayError::ValidationError(_)));
        let err = client.get_invoice(Some(""), None).await.unwrap_err();
        assert!(matches!(err, ChiefPayError::ValidationError(_)));

        assert!(client.rest().calls().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_sends_both_keys() {
        let client = AsyncClient::with_rest(RecordingRest::new(wallet_json()));

        let wallet = client.get_wallet(Some("w-1"), Some("o-1")).await.unwrap();
        assert_eq!(wallet.id, "w-1");

        let calls = client.rest().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Method::GET);
        assert_eq!(calls[0].1, Endpoint::Wallet);
        assert_eq!(
            calls[0].2,
            vec![
                ("id".to_string(), "w-1".to_string()),
                ("orderId".to_string(), "o-1".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_history_validates_before_request() {
        let client = AsyncClient::with_rest(RecordingRest::new(
            json!({"invoices": [], "totalCount": 0}),
        ));

        for (from, to, limit) in [
            ("2024-01-01", None, None),
            ("2024-01-01T00:00:00.000Z", Some("yesterday"), None),
            ("2024-01-01T00:00:00.000Z", None, Some(0)),
        ] {
            let err = client.get_invoices(from, to, limit).await.unwrap_err();
            assert!(matches!(err, ChiefPayError::ValidationError(_)));
        }
        assert!(client.rest().calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_query_defaults_limit() {
        let client = AsyncClient::with_rest(RecordingRest::new(
            json!({"transactions": [], "totalCount": 0}),
        ));

        let page = client
            .get_transactions(
                "2024-01-01T00:00:00.000Z",
                Some("2024-02-01T00:00:00.000Z"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);

        let calls = client.rest().calls();
        assert_eq!(calls[0].1, Endpoint::TransactionsHistory);
        assert_eq!(
            calls[0].2,
            vec![
                ("fromDate".to_string(), "2024-01-01T00:00:00.000Z".to_string()),
                ("limit".to_string(), "100".to_string()),
                ("toDate".to_string(), "2024-02-01T00:00:00.000Z".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_wallet_posts_order_id() {
        let client = AsyncClient::with_rest(RecordingRest::new(wallet_json()));

        client.create_wallet("o-1").await.unwrap();

        let calls = client.rest().calls();
        assert_eq!(calls[0].0, Method::POST);
        assert_eq!(calls[0].3, Some(json!({"orderId": "o-1"})));
    }

    #[tokio::test]
    async fn test_mapping_failure_is_payload_error() {
        let client = AsyncClient::with_rest(RecordingRest::new(json!({"unexpected": true})));

        let err = client.get_rates().await.unwrap_err();
        assert!(matches!(err, ChiefPayError::PayloadError(_)));
    }
}
