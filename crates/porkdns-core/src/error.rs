//! Error types for porkdns
//!
//! Errors are split into three families that the retry executor cares about:
//!
//! - **validation**: detected locally before any network call, never retried
//! - **transient remote**: the store may succeed if asked again (429, 5xx, no response)
//! - **permanent remote**: asking again will not help (bad credentials, 4xx, API refusal)
//!
//! [`Error::is_transient`] is the single place where that classification lives.

use thiserror::Error;

/// Result type alias for porkdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for porkdns
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input detected before issuing a remote call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced a response (connect failure, timeout, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The store accepted the request but reported a failure in its body
    #[error("API error: {0}")]
    Api(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State store errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Every attempt allowed by the retry policy failed
    #[error("after {attempts} attempts, last error: {source}")]
    RetriesExhausted {
        /// Total number of invocations made
        attempts: u32,
        /// The error returned by the final attempt
        #[source]
        source: Box<Error>,
    },

    /// The operation was aborted through its cancellation token
    #[error("operation cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an HTTP status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an API-level error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Whether asking the store again could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }

    /// Whether the error was raised locally before any network call
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// The error that ultimately caused this one, looking through retry exhaustion
    pub fn root(&self) -> &Error {
        match self {
            Self::RetriesExhausted { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
