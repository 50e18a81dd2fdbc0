pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod quality;
pub mod resolver;
pub mod rules;
pub mod service;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use cache::MokaCacheStore;
pub use config::ResolverConfig;
pub use error::AppError;
pub use models::{Extracted, FetchOutcome, ResolvedEntry, SourceEntry};
pub use resolver::{Resolution, Resolver, Strategy};
pub use rules::SiteRules;
pub use service::FeedService;
pub use traits::{CacheStore, ContentExtractor, FullTextService, NoFullText, NullCache, PageFetcher};
