//! Wiring of the production collaborators into a [`FeedService`].

use std::sync::Arc;

use hnfeeds_core::cache::MokaCacheStore;
use hnfeeds_core::config::ResolverConfig;
use hnfeeds_core::error::AppError;
use hnfeeds_core::resolver::Resolver;
use hnfeeds_core::rules::SiteRules;
use hnfeeds_core::service::FeedService;

use crate::fetcher::ReqwestFetcher;
use crate::fulltext::FullTextRssClient;
use crate::readability::ReadabilityExtractor;

/// The service as the binaries run it.
pub type DefaultFeedService =
    FeedService<ReqwestFetcher, FullTextRssClient, ReadabilityExtractor, MokaCacheStore>;

/// Rule tables from `config.rules_path`, or the built-in ones.
pub fn load_rules(config: &ResolverConfig) -> Result<SiteRules, AppError> {
    match &config.rules_path {
        Some(path) => {
            let rules = SiteRules::from_file(path)?;
            tracing::info!(path = %path.display(), "Loaded site rules");
            Ok(rules)
        }
        None => Ok(SiteRules::default()),
    }
}

/// Connect to the configured full-text service.
///
/// Returns `None` when no service is configured or the startup probe fails;
/// the remote strategy is then skipped for the life of the process.
pub async fn connect_fulltext(config: &ResolverConfig) -> Option<FullTextRssClient> {
    let Some(base_url) = &config.fulltext_url else {
        tracing::warn!("No full-text service configured, using local extraction only");
        return None;
    };

    let client = match FullTextRssClient::with_timeout(base_url, config.fetch_timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(url = %base_url, error = %e, "Invalid full-text service URL");
            return None;
        }
    };

    match client.probe().await {
        Ok(()) => Some(client),
        Err(e) => {
            tracing::error!(
                url = %client.base_url(),
                error = %e,
                "Full-text service unreachable, remote strategy disabled"
            );
            None
        }
    }
}

/// Build the feed service: rules, fetcher, optional full-text client,
/// readability extractor and in-process cache.
pub async fn build_feed_service(config: &ResolverConfig) -> Result<DefaultFeedService, AppError> {
    let rules = Arc::new(load_rules(config)?);
    let fetcher = ReqwestFetcher::with_timeout(config.fetch_timeout, Arc::clone(&rules))?;
    let fulltext = connect_fulltext(config).await;
    let extractor = ReadabilityExtractor::new()?;

    tracing::info!(
        fulltext = fulltext.is_some(),
        workers = config.max_workers,
        timeout_secs = config.fetch_timeout.as_secs(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Feed service ready"
    );

    let resolver =
        Resolver::build(fetcher, fulltext, extractor, rules).with_gates(config.quality_gates());
    Ok(FeedService::with_cache(
        resolver,
        MokaCacheStore::new(config.cache_capacity),
        config,
    ))
}
