use std::sync::Arc;
use std::time::Duration;

use atom_syndication::Feed;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache;
use crate::config::ResolverConfig;
use crate::error::AppError;
use crate::feed::{assemble_feed, parse_feed};
use crate::models::{ResolvedEntry, SourceEntry};
use crate::resolver::Resolver;
use crate::traits::{CacheStore, ContentExtractor, FullTextService, NullCache, PageFetcher};

/// Per-entry pipeline shared by all workers: cache check, strategy
/// resolution, cache write.
struct Pipeline<F, T, X, C>
where
    F: PageFetcher,
    T: FullTextService,
    X: ContentExtractor,
    C: CacheStore,
{
    resolver: Resolver<F, T, X>,
    cache: Option<C>,
    cache_ttl: Duration,
}

impl<F, T, X, C> Pipeline<F, T, X, C>
where
    F: PageFetcher,
    T: FullTextService,
    X: ContentExtractor,
    C: CacheStore,
{
    async fn resolve_entry(&self, entry: &SourceEntry) -> Result<ResolvedEntry, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache::lookup(cache, &entry.link).await {
                return Ok(hit);
            }
        }

        let resolved = self.resolver.resolve(entry).await.into_entry()?;

        if let Some(cache) = &self.cache {
            cache::store(cache, &resolved, self.cache_ttl).await;
        }
        Ok(resolved)
    }
}

/// Orchestrates a whole feed: fetch → parse → bounded fan-out → assemble.
///
/// Cheap to clone; clones share the resolver and cache.
pub struct FeedService<F, T, X, C>
where
    F: PageFetcher,
    T: FullTextService,
    X: ContentExtractor,
    C: CacheStore,
{
    pipeline: Arc<Pipeline<F, T, X, C>>,
    max_workers: usize,
    per_entry_timeout: Duration,
    fetch_timeout: Duration,
}

impl<F, T, X, C> Clone for FeedService<F, T, X, C>
where
    F: PageFetcher,
    T: FullTextService,
    X: ContentExtractor,
    C: CacheStore,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            max_workers: self.max_workers,
            per_entry_timeout: self.per_entry_timeout,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<F, T, X> FeedService<F, T, X, NullCache>
where
    F: PageFetcher + 'static,
    T: FullTextService + 'static,
    X: ContentExtractor + 'static,
{
    /// Create a service that recomputes every entry.
    pub fn new(resolver: Resolver<F, T, X>, config: &ResolverConfig) -> Self {
        Self::build(resolver, None, config)
    }
}

impl<F, T, X, C> FeedService<F, T, X, C>
where
    F: PageFetcher + 'static,
    T: FullTextService + 'static,
    X: ContentExtractor + 'static,
    C: CacheStore + 'static,
{
    /// Create a service that serves and stores entries through `cache`.
    pub fn with_cache(resolver: Resolver<F, T, X>, cache: C, config: &ResolverConfig) -> Self {
        Self::build(resolver, Some(cache), config)
    }

    pub fn build(resolver: Resolver<F, T, X>, cache: Option<C>, config: &ResolverConfig) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                resolver: resolver.with_fetch_timeout(config.fetch_timeout),
                cache,
                cache_ttl: config.cache_ttl,
            }),
            max_workers: config.max_workers.max(1),
            per_entry_timeout: config.per_entry_timeout(),
            fetch_timeout: config.fetch_timeout,
        }
    }

    pub fn resolver(&self) -> &Resolver<F, T, X> {
        &self.pipeline.resolver
    }

    /// Resolve a single entry through the cache.
    pub async fn resolve_entry(&self, entry: &SourceEntry) -> Result<ResolvedEntry, AppError> {
        self.pipeline.resolve_entry(entry).await
    }

    /// Resolve entries with the configured worker count and per-entry timeout.
    pub async fn resolve_all(&self, entries: Vec<SourceEntry>) -> Vec<ResolvedEntry> {
        self.resolve_all_with(entries, self.max_workers, self.per_entry_timeout)
            .await
    }

    /// Resolve entries concurrently, at most `limit` at a time.
    ///
    /// Entries that fail, time out or panic are logged and left out. The
    /// survivors come back in input order.
    pub async fn resolve_all_with(
        &self,
        entries: Vec<SourceEntry>,
        limit: usize,
        per_entry_timeout: Duration,
    ) -> Vec<ResolvedEntry> {
        let semaphore = Arc::new(Semaphore::new(limit.max(1)));
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok()?;

                match tokio::time::timeout(per_entry_timeout, pipeline.resolve_entry(&entry)).await
                {
                    Ok(Ok(resolved)) => Some((index, resolved)),
                    Ok(Err(e)) => {
                        tracing::error!(url = %entry.link, error = %e, "Failed to resolve entry");
                        None
                    }
                    Err(_) => {
                        tracing::warn!(
                            url = %entry.link,
                            timeout_ms = per_entry_timeout.as_millis() as u64,
                            "Entry resolution timed out"
                        );
                        None
                    }
                }
            });
        }

        let mut resolved = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(pair)) => resolved.push(pair),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "Entry task panicked"),
            }
        }

        resolved.sort_by_key(|(index, _)| *index);
        resolved.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Build the rewritten feed for `source_url`.
    ///
    /// Fails only when the source feed cannot be fetched or parsed, or has
    /// no entries. Individual entries never fail the feed.
    pub async fn create_feed(&self, source_url: &str) -> Result<Feed, AppError> {
        let body = self
            .pipeline
            .resolver
            .fetcher()
            .fetch(source_url)
            .await
            .into_body(self.fetch_timeout.as_secs())?;
        let entries = parse_feed(&body)?;

        tracing::info!(
            url = %source_url,
            entries = entries.len(),
            workers = self.max_workers,
            "Resolving feed entries"
        );

        let resolved = self.resolve_all(entries).await;

        tracing::info!(url = %source_url, added = resolved.len(), "Feed assembled");
        Ok(assemble_feed(source_url, &resolved))
    }
}
