use std::io;

#[derive(thiserror::Error, Debug)]
pub enum FalconError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("rate limit exceeded for {provider}; retry in {wait_ms}ms")]
    RateLimitExceeded { provider: String, wait_ms: u64 },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unknown error")]
    Unknown,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FalconError {
    /// Errors that must escape an adapter instead of degrading to a soft failure.
    pub fn is_fatal_for_live_scan(&self) -> bool {
        matches!(self, FalconError::RateLimitExceeded { .. })
    }
}

impl From<reqwest::Error> for FalconError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FalconError::Timeout
        } else if err.is_connect() {
            FalconError::Network(err.to_string())
        } else if err.is_status() {
            FalconError::Http(err.to_string())
        } else if err.is_decode() {
            FalconError::Decode(err.to_string())
        } else {
            FalconError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FalconError {
    fn from(err: serde_json::Error) -> Self {
        FalconError::Decode(err.to_string())
    }
}
