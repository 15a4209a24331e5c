use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default page size for the history endpoints
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

// Wire records keep amounts as the strings the server sent so that
// re-serialization is lossless; the `*_decimal` accessors parse on demand.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub name: String,
    pub rate: String,
}

impl Rate {
    pub fn rate_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        self.rate.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub chain: String,
    pub token: String,
    pub address: String,
    #[serde(rename = "tokenRate", alias = "token_rate")]
    pub token_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatDetails {
    pub name: String,
    pub amount: String,
    #[serde(rename = "payedAmount", alias = "payed_amount")]
    pub payed_amount: String,
    #[serde(rename = "feeRate", alias = "fee_rate")]
    pub fee_rate: String,
    pub bank: String,
    pub requisites: String,
    #[serde(rename = "cardOwner", alias = "card_owner")]
    pub card_owner: String,
}

/// Payment request created for a merchant order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(rename = "orderId", alias = "order_id")]
    pub order_id: String,
    #[serde(default)]
    pub description: String,
    pub amount: String,
    #[serde(rename = "payedAmount", alias = "payed_amount")]
    pub payed_amount: String,
    #[serde(rename = "feeIncluded", alias = "fee_included")]
    pub fee_included: bool,
    pub accuracy: String,
    pub discount: String,
    #[serde(rename = "feeRate", alias = "fee_rate")]
    pub fee_rate: String,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: String,
    #[serde(rename = "expiredAt", alias = "expired_at")]
    pub expired_at: String,
    /// Lifecycle state as reported by the server
    pub status: String,
    pub addresses: Vec<Address>,
    #[serde(
        rename = "FiatDetails",
        alias = "fiatDetails",
        alias = "fiat_details",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fiat_details: Option<Vec<FiatDetails>>,
}

impl Invoice {
    pub fn amount_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        self.amount.parse()
    }

    pub fn payed_amount_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        self.payed_amount.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    #[serde(rename = "orderId", alias = "order_id")]
    pub order_id: String,
    pub addresses: Vec<Address>,
}

/// On-chain payment received on a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: String,
    pub chain: String,
    pub token: String,
    pub value: String,
    pub usd: String,
    pub fee: String,
    pub wallet: Wallet,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: String,
    #[serde(rename = "blockCreatedAt", alias = "block_created_at")]
    pub block_created_at: String,
}

impl Transaction {
    pub fn value_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        self.value.parse()
    }

    pub fn usd_decimal(&self) -> Result<Decimal, rust_decimal::Error> {
        self.usd.parse()
    }
}

/// A page of a newest-first history listing
///
/// To fetch the following page pass `next_from_date()` as the next `from_date`.
pub trait History {
    type Item;

    fn items(&self) -> &[Self::Item];

    fn total_count(&self) -> u64;

    /// `createdAt` of the earliest item on this page
    fn next_from_date(&self) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicesHistory {
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(rename = "totalCount", alias = "total_count")]
    pub total_count: u64,
}

impl History for InvoicesHistory {
    type Item = Invoice;

    fn items(&self) -> &[Invoice] {
        &self.invoices
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn next_from_date(&self) -> Option<&str> {
        self.invoices.iter().map(|i| i.created_at.as_str()).min()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsHistory {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(rename = "totalCount", alias = "total_count")]
    pub total_count: u64,
}

impl History for TransactionsHistory {
    type Item = Transaction;

    fn items(&self) -> &[Transaction] {
        &self.transactions
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn next_from_date(&self) -> Option<&str> {
        self.transactions.iter().map(|t| t.created_at.as_str()).min()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNotification {
    pub invoice: Invoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionNotification {
    pub transaction: Transaction,
}

/// Push update delivered on the `notification` channel event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "invoice", alias = "Invoice", alias = "INVOICE")]
    Invoice(InvoiceNotification),
    #[serde(rename = "transaction", alias = "Transaction", alias = "TRANSACTION")]
    Transaction(TransactionNotification),
}

// Request bodies

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateInvoiceRequest {
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    #[serde(rename = "feeIncluded")]
    pub fee_included: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub accuracy: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateWalletRequest {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice_json() -> serde_json::Value {
        json!({
            "id": "inv-1",
            "orderId": "order-42",
            "description": "Premium plan",
            "amount": "10.50",
            "payedAmount": "0",
            "feeIncluded": true,
            "accuracy": "0.01",
            "discount": "0",
            "feeRate": "0.015",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "expiredAt": "2024-05-01T11:00:00.000Z",
            "status": "pending",
            "addresses": [
                {"chain": "TRON", "token": "USDT", "address": "TXyz", "tokenRate": "1.0001"}
            ],
            "FiatDetails": [
                {
                    "name": "RUB",
                    "amount": "950.00",
                    "payedAmount": "0",
                    "feeRate": "0.02",
                    "bank": "Bank",
                    "requisites": "0000",
                    "cardOwner": "IVAN"
                }
            ]
        })
    }

    #[test]
    fn test_invoice_wire_round_trip() {
        let wire = invoice_json();
        let invoice: Invoice = serde_json::from_value(wire.clone()).unwrap();

        assert_eq!(invoice.order_id, "order-42");
        assert!(invoice.fee_included);
        assert_eq!(invoice.addresses[0].token_rate, "1.0001");
        assert_eq!(serde_json::to_value(&invoice).unwrap(), wire);
    }

    #[test]
    fn test_invoice_accepts_internal_names() {
        let internal = json!({
            "id": "inv-1",
            "order_id": "order-42",
            "description": "Premium plan",
            "amount": "10.50",
            "payed_amount": "0",
            "fee_included": false,
            "accuracy": "0.01",
            "discount": "0",
            "fee_rate": "0.015",
            "created_at": "2024-05-01T10:00:00.000Z",
            "expired_at": "2024-05-01T11:00:00.000Z",
            "status": "created",
            "addresses": []
        });

        let invoice: Invoice = serde_json::from_value(internal).unwrap();
        assert_eq!(invoice.order_id, "order-42");
        assert!(invoice.fiat_details.is_none());

        let out = serde_json::to_value(&invoice).unwrap();
        assert_eq!(out["orderId"], "order-42");
        assert_eq!(out["feeIncluded"], false);
        assert!(out.get("order_id").is_none());
        assert!(out.get("FiatDetails").is_none());
    }

    #[test]
    fn test_invoice_decimal_accessors() {
        let invoice: Invoice = serde_json::from_value(invoice_json()).unwrap();
        assert_eq!(invoice.amount_decimal().unwrap(), Decimal::new(1050, 2));
        assert_eq!(invoice.payed_amount_decimal().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_notification_tagged_union() {
        let raw = json!({
            "type": "transaction",
            "transaction": {
                "txid": "0xabc",
                "chain": "BSC",
                "token": "USDT",
                "value": "25",
                "usd": "25",
                "fee": "0.1",
                "wallet": {"id": "w-1", "orderId": "o-1", "addresses": []},
                "createdAt": "2024-05-01T10:00:00.000Z",
                "blockCreatedAt": "2024-05-01T10:00:05.000Z"
            }
        });

        let notification: Notification = serde_json::from_value(raw.clone()).unwrap();
        match &notification {
            Notification::Transaction(n) => {
                assert_eq!(n.transaction.txid, "0xabc");
                assert_eq!(n.transaction.wallet.order_id, "o-1");
            }
            Notification::Invoice(_) => panic!("Expected transaction notification"),
        }
        assert_eq!(serde_json::to_value(&notification).unwrap(), raw);
    }

    #[test]
    fn test_notification_unknown_type_rejected() {
        let raw = json!({"type": "refund", "refund": {}});
        assert!(serde_json::from_value::<Notification>(raw).is_err());
    }

    #[test]
    fn test_history_cursor() {
        let mut newer: Invoice = serde_json::from_value(invoice_json()).unwrap();
        newer.created_at = "2024-05-02T10:00:00.000Z".to_string();
        let older: Invoice = serde_json::from_value(invoice_json()).unwrap();

        let page = InvoicesHistory {
            invoices: vec![newer, older],
            total_count: 7,
        };

        assert_eq!(page.total_count(), 7);
        assert_eq!(page.items().len(), 2);
        assert_eq!(page.next_from_date(), Some("2024-05-01T10:00:00.000Z"));

        let empty = TransactionsHistory {
            transactions: vec![],
            total_count: 0,
        };
        assert!(empty.is_empty());
        assert_eq!(empty.next_from_date(), None);
    }

    #[test]
    fn test_create_invoice_request_wire_names() {
        let request = CreateInvoiceRequest {
            order_id: "order-1".to_string(),
            description: "Coffee".to_string(),
            amount: Decimal::new(450, 2),
            currency: "USD".to_string(),
            fee_included: false,
            accuracy: Decimal::new(1, 2),
            discount: Decimal::ZERO,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "orderId": "order-1",
                "description": "Coffee",
                "amount": "4.50",
                "currency": "USD",
                "feeIncluded": false,
                "accuracy": "0.01",
                "discount": "0"
            })
        );
    }
}
