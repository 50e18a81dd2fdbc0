use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// One item of the input feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Article URL, used as the entry identity.
    pub link: String,
    pub title: String,
    /// HTML/text summary as provided by the feed.
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl SourceEntry {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            description: String::new(),
            published_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_published(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Host of the link, used as the author name of resolved entries.
    ///
    /// Fails for an empty or unparseable link, which makes the entry
    /// unresolvable even by pass-through.
    pub fn author_name(&self) -> Result<String, AppError> {
        if self.link.trim().is_empty() {
            return Err(AppError::MalformedEntry("entry has no link".into()));
        }
        let url = Url::parse(&self.link)
            .map_err(|e| AppError::MalformedEntry(format!("invalid link '{}': {e}", self.link)))?;
        Ok(match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        })
    }
}

/// The output unit of the pipeline.
///
/// Field names are part of the cache wire format; renaming one requires a
/// bump of [`crate::cache::CACHE_FORMAT_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub id: String,
    pub link: String,
    pub title: String,
    /// HTML content.
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author_name: String,
}

/// Title and HTML produced by either the remote service or the local extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub content: String,
}

/// Classified result of a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success { body: Vec<u8>, status: u16 },
    Timeout,
    HttpError(u16),
    NetworkError(String),
}

impl FetchOutcome {
    /// Collapse into the body, mapping every non-success variant to its
    /// [`AppError`] counterpart. `timeout_secs` is only used for the message.
    pub fn into_body(self, timeout_secs: u64) -> Result<Vec<u8>, AppError> {
        match self {
            FetchOutcome::Success { body, .. } => Ok(body),
            FetchOutcome::Timeout => Err(AppError::FetchTimeout(timeout_secs)),
            FetchOutcome::HttpError(status) => Err(AppError::FetchHttpError(status)),
            FetchOutcome::NetworkError(cause) => Err(AppError::FetchNetworkError(cause)),
        }
    }
}
