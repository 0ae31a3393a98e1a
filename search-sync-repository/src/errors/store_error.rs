//! Document store error types.

use thiserror::Error;

/// Errors that can occur while talking to the document store or its
/// change feeds.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The store or feed endpoint is unreachable.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store rejected the caller's credentials.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// A table scan failed mid-stream.
    #[error("Scan error: {0}")]
    ScanError(String),

    /// The change feed failed to deliver a record.
    #[error("Feed error: {0}")]
    FeedError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    /// Create a scan error.
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::ScanError(msg.into())
    }

    /// Create a feed error.
    pub fn feed(msg: impl Into<String>) -> Self {
        Self::FeedError(msg.into())
    }

    /// Fatal errors must not be retried; reconnecting with the same
    /// rejected credentials cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthError(_))
    }
}
