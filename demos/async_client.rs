//! Async REST usage through `AsyncClient` and the `AsyncChiefPay` facade.
//!
//! Run with `CHIEFPAY_API_KEY=... cargo run --example async_client`.

use chiefpay::core::config::DEFAULT_ENV_PREFIX;
use chiefpay::{AsyncChiefPay, AsyncClient, ChiefPayConfig, CreateInvoiceRequest, History};
use rust_decimal::Decimal;
use std::str::FromStr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ChiefPayConfig::from_env(DEFAULT_ENV_PREFIX)?;
    let client = AsyncClient::new(config.clone())?;

    let rates = client.get_rates().await?;
    println!("Exchange rates: {:?}", rates);

    let invoice = client
        .create_invoice(&CreateInvoiceRequest {
            order_id: "564cca2e-30d5-4c69-90d5-fa3f368aea90".to_string(),
            description: "Test Invoice".to_string(),
            amount: Decimal::from_str("15.4")?,
            currency: "RUB".to_string(),
            fee_included: false,
            accuracy: Decimal::from_str("0.01")?,
            discount: Decimal::ZERO,
        })
        .await?;
    println!("Created invoice: {:?}", invoice);

    let details = client
        .get_invoice(Some(&invoice.id), Some(&invoice.order_id))
        .await?;
    println!("Invoice details: {:?}", details);

    let history = client
        .get_invoices("2025-03-01T15:18:00.000Z", None, None)
        .await?;
    println!("Invoice history: {:?}", history);
    client.close();

    let chiefpay = AsyncChiefPay::new(config)?;

    let wallet = chiefpay.rest.get_wallet(Some("123"), Some("456")).await?;
    println!("Wallet details: {:?}", wallet);

    let mut page = chiefpay
        .rest
        .get_transactions("2025-03-01T15:18:00.000Z", None, None)
        .await?;
    let mut seen = page.items().len() as u64;
    println!("Transaction history: {:?}", page);

    while seen < page.total_count() {
        let Some(from_date) = page.next_from_date().map(str::to_string) else {
            break;
        };
        page = chiefpay
            .rest
            .get_transactions(&from_date, Some("2025-03-02T11:41:00.000Z"), Some(100))
            .await?;
        if page.is_empty() {
            break;
        }
        seen += page.items().len() as u64;
        println!("Additional transactions: {:?}", page);
    }

    chiefpay.close().await?;
    Ok(())
}
