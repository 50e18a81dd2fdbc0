//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::error::{AppError, RemoteFailure};
use crate::models::{Extracted, FetchOutcome, ResolvedEntry, SourceEntry};
use crate::traits::{CacheStore, ContentExtractor, FullTextService, PageFetcher};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn sample_entry(link: &str, title: &str) -> SourceEntry {
    SourceEntry::new(link, title)
        .with_description("<p>Original summary</p>")
        .with_published(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
}

pub fn sample_resolved(link: &str) -> ResolvedEntry {
    ResolvedEntry {
        id: link.to_string(),
        link: link.to_string(),
        title: "Cached title".to_string(),
        content: "<p>cached</p>".to_string(),
        published_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
        author_name: "example.com".to_string(),
    }
}

pub fn article_html(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher returning a configured outcome per URL.
///
/// Unknown URLs yield a network error. A URL can also be given a delay to
/// simulate a page that hangs.
#[derive(Clone, Default)]
pub struct MockFetcher {
    outcomes: Arc<Mutex<HashMap<String, FetchOutcome>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_outcome(
            url,
            FetchOutcome::Success {
                body: html.as_bytes().to_vec(),
                status: 200,
            },
        )
    }

    pub fn with_outcome(self, url: &str, outcome: FetchOutcome) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), outcome);
        self
    }

    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.calls.lock().unwrap().push(url.to_string());

        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.outcomes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::NetworkError(format!("no mock for {url}")))
    }
}

// ---------------------------------------------------------------------------
// MockFullText
// ---------------------------------------------------------------------------

/// Mock full-text service returning one configured result for every URL.
#[derive(Clone)]
pub struct MockFullText {
    result: Arc<Mutex<Result<Extracted, RemoteFailure>>>,
    delay: Option<Duration>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockFullText {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(Extracted {
                title: title.to_string(),
                content: content.to_string(),
            }))),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(reason: RemoteFailure) -> Self {
        Self {
            result: Arc::new(Mutex::new(Err(reason))),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer only after `delay`, like a service that is slow to respond.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl FullTextService for MockFullText {
    async fn fetch_fulltext(&self, url: &str) -> Result<Extracted, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::RemoteServiceError)
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that reads the `<title>` and re-wraps the page's `<body>`
/// contents, or returns a fixed result.
#[derive(Clone, Default)]
pub struct MockExtractor {
    fixed: Arc<Mutex<Option<Extracted>>>,
}

impl MockExtractor {
    pub fn wrapping() -> Self {
        Self::default()
    }

    pub fn fixed(title: &str, content: &str) -> Self {
        Self {
            fixed: Arc::new(Mutex::new(Some(Extracted {
                title: title.to_string(),
                content: content.to_string(),
            }))),
        }
    }
}

impl ContentExtractor for MockExtractor {
    fn extract(&self, html: &str) -> Result<Extracted, AppError> {
        if let Some(fixed) = self.fixed.lock().unwrap().clone() {
            return Ok(fixed);
        }
        let between = |open: &str, close: &str| {
            html.split(open)
                .nth(1)
                .and_then(|rest| rest.split(close).next())
                .map(str::to_string)
        };
        let title = between("<title>", "</title>").unwrap_or_default();
        let body = between("<body>", "</body>").unwrap_or_else(|| html.to_string());
        Ok(Extracted {
            title,
            content: format!("<body>{body}</body>"),
        })
    }
}

// ---------------------------------------------------------------------------
// MockCache
// ---------------------------------------------------------------------------

/// Mock cache backed by a `HashMap`, recording the TTL of every write.
#[derive(Clone, Default)]
pub struct MockCache {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    writes: Arc<Mutex<Vec<(String, Duration)>>>,
    fail: bool,
}

impl MockCache {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cache whose every operation fails with an I/O error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn ttls(&self) -> Vec<(String, Duration)> {
        self.writes.lock().unwrap().clone()
    }
}

impl CacheStore for MockCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        if self.fail {
            return Err(AppError::CacheIoError("connection refused".into()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::CacheIoError("connection refused".into()));
        }
        self.entries.lock().unwrap().insert(key.to_string(), value);
        self.writes.lock().unwrap().push((key.to_string(), ttl));
        Ok(())
    }
}
