use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{Extracted, FetchOutcome};

/// Performs a single GET of an article or feed URL.
///
/// Implementations never retry; every failure is reported through the
/// returned [`FetchOutcome`].
pub trait PageFetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// External full-text extraction service.
pub trait FullTextService: Send + Sync + Clone {
    /// Ask the service for the full article behind `url`.
    fn fetch_fulltext(&self, url: &str)
    -> impl Future<Output = Result<Extracted, AppError>> + Send;
}

/// Isolates the main article content of a fetched HTML page.
pub trait ContentExtractor: Send + Sync + Clone {
    fn extract(&self, html: &str) -> Result<Extracted, AppError>;
}

/// Byte-oriented key-value cache with per-record TTL.
pub trait CacheStore: Send + Sync + Clone {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, AppError>> + Send;

    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A cache that never holds anything, for when caching is disabled.
#[derive(Debug, Clone)]
pub struct NullCache;

impl CacheStore for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), AppError> {
        Ok(())
    }
}

/// Stand-in for the remote strategy when no full-text service is configured.
#[derive(Debug, Clone)]
pub struct NoFullText;

impl FullTextService for NoFullText {
    async fn fetch_fulltext(&self, _url: &str) -> Result<Extracted, AppError> {
        Err(AppError::ConfigError(
            "no full-text service configured".to_string(),
        ))
    }
}
