use crate::builder::ChiefPayBuilder;
use crate::client::async_client::AsyncClient;
use crate::core::config::ChiefPayConfig;
use crate::core::errors::ChiefPayError;
use crate::core::kernel::{BlockingRuntime, ReqwestRest, RestClient};
use crate::core::types::{
    CreateInvoiceRequest, Invoice, InvoicesHistory, Rate, TransactionsHistory, Wallet,
};

/// Blocking ChiefPay REST client
///
/// Runs [`AsyncClient`] on a private current-thread runtime. Must not be
/// called from inside an async context.
///
/// # Example
/// ```rust,no_run
/// use chiefpay::{ChiefPayConfig, Client};
///
/// let client = Client::new(ChiefPayConfig::new("api-key"))?;
/// let wallet = client.create_wallet("order-1")?;
/// println!("{}", wallet.id);
/// # Ok::<(), chiefpay::ChiefPayError>(())
/// ```
#[derive(Debug)]
pub struct Client<R: RestClient = ReqwestRest> {
    inner: AsyncClient<R>,
    runtime: BlockingRuntime,
}

impl Client {
    pub fn new(config: ChiefPayConfig) -> Result<Self, ChiefPayError> {
        ChiefPayBuilder::new().with_config(config).build_client()
    }
}

impl<R: RestClient> Client<R> {
    pub fn with_async(inner: AsyncClient<R>) -> Result<Self, ChiefPayError> {
        Ok(Self {
            inner,
            runtime: BlockingRuntime::current_thread()?,
        })
    }

    pub fn get_rates(&self) -> Result<Vec<Rate>, ChiefPayError> {
        self.runtime.block_on(self.inner.get_rates())
    }

    pub fn get_invoice(
        &self,
        id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<Invoice, ChiefPayError> {
        self.runtime.block_on(self.inner.get_invoice(id, order_id))
    }

    pub fn get_wallet(
        &self,
        id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<Wallet, ChiefPayError> {
        self.runtime.block_on(self.inner.get_wallet(id, order_id))
    }

    pub fn get_invoices(
        &self,
        from_date: &str,
        to_date: Option<&str>,
        limit: Option<u32>,
    ) -> Result<InvoicesHistory, ChiefPayError> {
        self.runtime
            .block_on(self.inner.get_invoices(from_date, to_date, limit))
    }

    pub fn get_transactions(
        &self,
        from_date: &str,
        to_date: Option<&str>,
        limit: Option<u32>,
    ) -> Result<TransactionsHistory, ChiefPayError> {
        self.runtime
            .block_on(self.inner.get_transactions(from_date, to_date, limit))
    }

    pub fn create_invoice(&self, request: &CreateInvoiceRequest) -> Result<Invoice, ChiefPayError> {
        self.runtime.block_on(self.inner.create_invoice(request))
    }

    pub fn create_wallet(&self, order_id: &str) -> Result<Wallet, ChiefPayError> {
        self.runtime.block_on(self.inner.create_wallet(order_id))
    }

    /// Release the HTTP session and the private runtime
    pub fn close(self) {
        self.inner.close();
    }
}
