use std::fmt;

use thiserror::Error;

/// Why the local extractor's output was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The page title carried a known bot-challenge phrase.
    BotCheck,
    /// The fragment was oversized and not a single `<body>` wrapper.
    Implausible,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BotCheck => write!(f, "bot check"),
            RejectReason::Implausible => write!(f, "implausible extraction"),
        }
    }
}

/// Why the remote full-text service did not produce usable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    NetworkError(String),
    BadStatus(u16),
    EmptyResult,
    Placeholder,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::NetworkError(cause) => write!(f, "network error: {cause}"),
            RemoteFailure::BadStatus(status) => write!(f, "HTTP {status}"),
            RemoteFailure::EmptyResult => write!(f, "empty result"),
            RemoteFailure::Placeholder => write!(f, "unable to retrieve full-text content"),
        }
    }
}

/// Application-wide error types for hnfeeds.
#[derive(Error, Debug)]
pub enum AppError {
    /// The page fetch exceeded its timeout.
    #[error("Fetch timed out after {0} seconds")]
    FetchTimeout(u64),

    /// The page answered with a non-success status.
    #[error("HTTP error: status {0}")]
    FetchHttpError(u16),

    /// DNS, connect, TLS or body read failure.
    #[error("Network error: {0}")]
    FetchNetworkError(String),

    /// Local extraction produced something we refuse to publish.
    #[error("Extraction rejected: {0}")]
    ExtractionRejected(RejectReason),

    /// The remote full-text service failed.
    #[error("Full-text service error: {0}")]
    RemoteServiceError(RemoteFailure),

    /// Cache read or write failed.
    #[error("Cache error: {0}")]
    CacheIoError(String),

    /// The source feed was empty or could not be parsed.
    #[error("Feed parse error: {0}")]
    FeedParseError(String),

    /// The output document could not be written.
    #[error("Feed write error: {0}")]
    FeedWriteError(String),

    /// The entry lacks what pass-through needs (a usable link).
    #[error("Malformed entry: {0}")]
    MalformedEntry(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true for failures the strategy chain recovers from by falling
    /// back to the next strategy.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            AppError::FetchTimeout(_)
                | AppError::FetchHttpError(_)
                | AppError::FetchNetworkError(_)
                | AppError::ExtractionRejected(_)
                | AppError::RemoteServiceError(_)
        )
    }
}
