pub mod fetcher;
pub mod fulltext;
pub mod readability;
pub mod setup;
pub mod user_agent;

pub use fetcher::ReqwestFetcher;
pub use fulltext::FullTextRssClient;
pub use readability::ReadabilityExtractor;
pub use setup::{DefaultFeedService, build_feed_service};
pub use user_agent::UserAgentPool;
