use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChiefPayError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitError { attempts: u32 },

    #[error("Invalid payload: {0}")]
    PayloadError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ChiefPayError {
    /// Whether repeating the same call later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitError { .. } | Self::NetworkError(_) | Self::ConnectionError(_)
        ) || matches!(self, Self::HttpError { status, .. } if *status >= 500)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            Self::RateLimitError { .. } => Some(429),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChiefPayError>;
