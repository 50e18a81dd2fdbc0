//! Per-entry strategy selection.
//!
//! An entry is resolved by walking an ordered list of candidate strategies
//! and stopping at the first one that succeeds. Pass-through always closes
//! the list, so every well-formed entry resolves to something.
//!
//! The network strategies of one entry share a deadline of one fetch timeout.
//! Once it passes, the remaining network strategies are skipped, so
//! pass-through is reached well inside the per-entry budget of the fan-out.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::error::{AppError, RejectReason};
use crate::models::{Extracted, ResolvedEntry, SourceEntry};
use crate::quality::QualityGates;
use crate::rules::{DomainRule, SiteRules};
use crate::traits::{ContentExtractor, FullTextService, NoFullText, PageFetcher};

/// A candidate way of producing a [`ResolvedEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    PassThrough { title_prefix: Option<String> },
    FullText,
    Local,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::PassThrough { .. } => write!(f, "no_change"),
            Strategy::FullText => write!(f, "fulltext_rss"),
            Strategy::Local => write!(f, "readability"),
        }
    }
}

/// What the strategy chain produced for one entry.
#[derive(Debug)]
pub enum Resolution {
    PassThrough(ResolvedEntry),
    Remote(ResolvedEntry),
    Local(ResolvedEntry),
    Failed(AppError),
}

impl Resolution {
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Resolution::PassThrough(_) => "no_change",
            Resolution::Remote(_) => "fulltext_rss",
            Resolution::Local(_) => "readability",
            Resolution::Failed(_) => "failed",
        }
    }

    pub fn into_entry(self) -> Result<ResolvedEntry, AppError> {
        match self {
            Resolution::PassThrough(e) | Resolution::Remote(e) | Resolution::Local(e) => Ok(e),
            Resolution::Failed(err) => Err(err),
        }
    }
}

/// Chooses and runs the strategies for each entry.
///
/// Generic over its I/O collaborators so tests can swap in mocks. All
/// state is read-only after construction; one instance is shared by every
/// worker.
pub struct Resolver<F, T, X>
where
    F: PageFetcher,
    T: FullTextService,
    X: ContentExtractor,
{
    fetcher: F,
    fulltext: Option<T>,
    extractor: X,
    rules: Arc<SiteRules>,
    gates: QualityGates,
    fetch_timeout: Duration,
}

impl<F, X> Resolver<F, NoFullText, X>
where
    F: PageFetcher,
    X: ContentExtractor,
{
    /// Create a resolver without a full-text service.
    pub fn new(fetcher: F, extractor: X, rules: Arc<SiteRules>) -> Self {
        Self::build(fetcher, None, extractor, rules)
    }
}

impl<F, T, X> Resolver<F, T, X>
where
    F: PageFetcher,
    T: FullTextService,
    X: ContentExtractor,
{
    /// Create a resolver that sends fulltext-eligible links to `fulltext`.
    pub fn with_fulltext(fetcher: F, fulltext: T, extractor: X, rules: Arc<SiteRules>) -> Self {
        Self::build(fetcher, Some(fulltext), extractor, rules)
    }

    /// Create a resolver whose full-text service may be absent, e.g. after a
    /// failed startup probe.
    pub fn build(fetcher: F, fulltext: Option<T>, extractor: X, rules: Arc<SiteRules>) -> Self {
        Self {
            fetcher,
            fulltext,
            extractor,
            rules,
            gates: QualityGates::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    pub fn with_gates(mut self, gates: QualityGates) -> Self {
        self.gates = gates;
        self
    }

    /// Deadline shared by the network strategies of one entry.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Ordered candidate strategies for an entry.
    pub fn plan(&self, entry: &SourceEntry) -> Vec<Strategy> {
        match self.rules.classify(&entry.link) {
            DomainRule::Pdf => vec![Strategy::PassThrough {
                title_prefix: Some("pdf".into()),
            }],
            DomainRule::Ignored { title_prefix } => vec![Strategy::PassThrough { title_prefix }],
            DomainRule::FullTextEligible if self.fulltext.is_some() => vec![
                Strategy::FullText,
                Strategy::Local,
                Strategy::PassThrough { title_prefix: None },
            ],
            DomainRule::FullTextEligible | DomainRule::Default => vec![
                Strategy::Local,
                Strategy::PassThrough { title_prefix: None },
            ],
        }
    }

    /// Resolve one entry. Never fails outright: the worst case is
    /// [`Resolution::Failed`] for an entry that lacks a usable link.
    pub async fn resolve(&self, entry: &SourceEntry) -> Resolution {
        let author_name = match entry.author_name() {
            Ok(author) => author,
            Err(e) => return Resolution::Failed(e),
        };

        let deadline = Instant::now() + self.fetch_timeout;
        let plan = self.plan(entry);
        for strategy in &plan {
            let attempt = match strategy {
                Strategy::PassThrough { title_prefix } => Ok(Resolution::PassThrough(
                    pass_through(entry, title_prefix.as_deref(), &author_name),
                )),
                Strategy::FullText => self
                    .before(deadline, self.from_fulltext(entry))
                    .await
                    .map(|x| Resolution::Remote(merge(entry, x, &author_name))),
                Strategy::Local => self
                    .before(deadline, self.from_page(entry))
                    .await
                    .map(|x| Resolution::Local(merge(entry, x, &author_name))),
            };

            match attempt {
                Ok(resolution) => {
                    tracing::info!(url = %entry.link, strategy = %strategy, "Resolved entry");
                    return resolution;
                }
                Err(e) => log_fallback(strategy, &entry.link, &e),
            }
        }

        Resolution::Failed(AppError::MalformedEntry(format!(
            "no strategy resolved {}",
            entry.link
        )))
    }

    /// Run a network strategy unless the entry's deadline has passed.
    async fn before<Fut>(&self, deadline: Instant, attempt: Fut) -> Result<Extracted, AppError>
    where
        Fut: Future<Output = Result<Extracted, AppError>>,
    {
        let expired = || AppError::FetchTimeout(self.fetch_timeout.as_secs());
        if Instant::now() >= deadline {
            return Err(expired());
        }
        tokio::time::timeout_at(deadline, attempt)
            .await
            .unwrap_or_else(|_| Err(expired()))
    }

    async fn from_fulltext(&self, entry: &SourceEntry) -> Result<Extracted, AppError> {
        match &self.fulltext {
            Some(service) => service.fetch_fulltext(&entry.link).await,
            None => Err(AppError::ConfigError(
                "no full-text service configured".into(),
            )),
        }
    }

    async fn from_page(&self, entry: &SourceEntry) -> Result<Extracted, AppError> {
        let body = self
            .fetcher
            .fetch(&entry.link)
            .await
            .into_body(self.fetch_timeout.as_secs())?;
        let html = String::from_utf8_lossy(&body);

        let extracted = self.extractor.extract(&html)?;
        self.gates.check(&extracted)?;
        Ok(extracted)
    }
}

/// The entry as the source feed had it, with an optional `[prefix]` title.
pub fn pass_through(
    entry: &SourceEntry,
    title_prefix: Option<&str>,
    author_name: &str,
) -> ResolvedEntry {
    let title = match title_prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("[{prefix}] {}", entry.title),
        None => entry.title.clone(),
    };

    ResolvedEntry {
        id: entry.link.clone(),
        link: entry.link.clone(),
        title,
        content: entry.description.clone(),
        published_at: entry.published_at,
        author_name: author_name.to_string(),
    }
}

/// Extracted content followed by the feed's own description, under the
/// feed's own title.
fn merge(entry: &SourceEntry, extracted: Extracted, author_name: &str) -> ResolvedEntry {
    let mut content = extracted.content;
    content.push_str(&entry.description);

    ResolvedEntry {
        id: entry.link.clone(),
        link: entry.link.clone(),
        title: entry.title.clone(),
        content,
        published_at: entry.published_at,
        author_name: author_name.to_string(),
    }
}

fn log_fallback(strategy: &Strategy, link: &str, err: &AppError) {
    match err {
        AppError::FetchTimeout(secs) => {
            tracing::warn!(url = %link, %strategy, timeout_secs = secs, "Fetch timed out");
        }
        AppError::FetchHttpError(status) => {
            tracing::error!(url = %link, %strategy, status, "Bad HTTP status");
        }
        AppError::ExtractionRejected(RejectReason::BotCheck) => {
            tracing::warn!(url = %link, %strategy, "Bot check page, discarding extraction");
        }
        e if e.is_fallback() => {
            tracing::warn!(url = %link, %strategy, error = %e, "Strategy failed, falling back");
        }
        e => {
            tracing::error!(url = %link, %strategy, error = %e, "Strategy errored, falling back");
        }
    }
}
