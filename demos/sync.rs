//! Blocking REST usage: rates, invoice creation, lookups and history paging.
//!
//! Run with `CHIEFPAY_API_KEY=... cargo run --example sync`.

use chiefpay::core::config::DEFAULT_ENV_PREFIX;
use chiefpay::{ChiefPay, ChiefPayConfig, Client, CreateInvoiceRequest, History};
use rust_decimal::Decimal;
use std::str::FromStr;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ChiefPayConfig::from_env(DEFAULT_ENV_PREFIX)?;
    let client = Client::new(config.clone())?;

    let rates = client.get_rates()?;
    println!("Exchange rates: {:?}", rates);

    let invoice = client.create_invoice(&CreateInvoiceRequest {
        order_id: "564cca2e-30d5-4c69-90d5-fa3f368aea90".to_string(),
        description: "Test Invoice".to_string(),
        amount: Decimal::from_str("15.4")?,
        currency: "RUB".to_string(),
        fee_included: false,
        // payment counts as complete once 99% of the amount arrives
        accuracy: Decimal::from_str("0.01")?,
        discount: Decimal::ZERO,
    })?;
    println!("Created invoice: {:?}", invoice);

    let details = client.get_invoice(Some(&invoice.id), None)?;
    println!("Invoice details: {:?}", details);

    let history = client.get_invoices("2025-03-01T15:18:00.000Z", None, None)?;
    println!("Invoice history: {:?}", history);

    if history.total_count() > history.items().len() as u64 {
        if let Some(from_date) = history.next_from_date() {
            println!("Fetching more invoices...");
            let more = client.get_invoices(from_date, Some("2025-03-02T11:41:00.000Z"), Some(100))?;
            println!("Additional invoices: {:?}", more);
        }
    }
    client.close();

    // REST and event stream under one handle
    let chiefpay = ChiefPay::new(config)?;

    let wallet = chiefpay.rest.get_wallet(Some("123"), Some("456"))?;
    println!("Wallet details: {:?}", wallet);

    let transactions = chiefpay
        .rest
        .get_transactions("2025-03-01T15:18:00.000Z", None, None)?;
    println!("Transaction history: {:?}", transactions);

    chiefpay.close()?;
    Ok(())
}
