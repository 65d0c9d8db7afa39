use thiserror::Error;

/// Errors raised while talking to the listings API
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Transport failure, including request timeouts
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("http {status} from {url}")]
    Http { status: u16, url: String },

    /// The response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// A requested id does not exist
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The owning store has been torn down
    #[error("lookup registry is closed")]
    Closed,
}

impl ApiError {
    /// Returns true for failures caused by the network or the server rather
    /// than by the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
