use std::fmt;

/// API version segment every path is mounted under
pub const API_VERSION: &str = "v1";

/// Closed set of server endpoints the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Rates,
    Invoice,
    Wallet,
    InvoicesHistory,
    TransactionsHistory,
    /// Real-time channel; mounted under the version prefix by the socket client
    Socket,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Rates => "/v1/rates",
            Self::Invoice => "/v1/invoice",
            Self::Wallet => "/v1/wallet",
            Self::InvoicesHistory => "/v1/invoices/history",
            Self::TransactionsHistory => "/v1/transactions/history",
            Self::Socket => "/socket.io",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rates => "rates",
            Self::Invoice => "invoice",
            Self::Wallet => "wallet",
            Self::InvoicesHistory => "invoices_history",
            Self::TransactionsHistory => "transactions_history",
            Self::Socket => "socket",
        }
    }

    /// Full URL for this endpoint under `base_url`
    pub fn url(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Rates.path(), "/v1/rates");
        assert_eq!(Endpoint::InvoicesHistory.path(), "/v1/invoices/history");
        assert_eq!(
            Endpoint::TransactionsHistory.path(),
            "/v1/transactions/history"
        );
        assert_eq!(Endpoint::Socket.path(), "/socket.io");
    }

    #[test]
    fn test_endpoint_url_joins_base() {
        assert_eq!(
            Endpoint::Invoice.url("https://api.chiefpay.org/"),
            "https://api.chiefpay.org/v1/invoice"
        );
        assert_eq!(
            Endpoint::Wallet.url("http://127.0.0.1:1234"),
            "http://127.0.0.1:1234/v1/wallet"
        );
    }
}
