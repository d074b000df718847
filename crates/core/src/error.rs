use thiserror::Error;

pub type FunnelResult<T> = Result<T, FunnelError>;

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ads API request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Ads API connection error: {0}")]
    Connection(String),

    #[error("Ads API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Ads API response could not be decoded: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for FunnelError {
    fn from(err: config::ConfigError) -> Self {
        FunnelError::Config(err.to_string())
    }
}
