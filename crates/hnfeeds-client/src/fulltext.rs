use std::time::Duration;

use hnfeeds_core::config::DEFAULT_FETCH_TIMEOUT_SECS;
use hnfeeds_core::error::{AppError, RemoteFailure};
use hnfeeds_core::feed::parse_feed;
use hnfeeds_core::models::Extracted;
use hnfeeds_core::traits::FullTextService;
use reqwest::Client;
use url::Url;

/// Marker the service puts in the item body when it could not extract anything.
pub const PLACEHOLDER: &str = "[unable to retrieve full-text content]";

/// Client for a self-hosted full-text-rss instance.
///
/// The service answers with a one-item feed whose description holds the
/// extracted article.
#[derive(Clone)]
pub struct FullTextRssClient {
    client: Client,
    base_url: String,
}

impl FullTextRssClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Url::parse(&base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid full-text service URL '{base_url}': {e}"))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The service endpoint for `article_url`, with the target fully escaped.
    pub fn request_url(&self, article_url: &str) -> String {
        let escaped: String = url::form_urlencoded::byte_serialize(article_url.as_bytes()).collect();
        format!(
            "{}makefulltextfeed.php?url={escaped}&links=preserve",
            self.base_url
        )
    }

    /// Check that the service answers on its base URL.
    pub async fn probe(&self) -> Result<(), AppError> {
        tracing::info!(url = %self.base_url, "Probing full-text service");

        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| AppError::RemoteServiceError(RemoteFailure::NetworkError(e.to_string())))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(AppError::RemoteServiceError(RemoteFailure::BadStatus(
                status,
            )));
        }

        tracing::info!(url = %self.base_url, "Full-text service reachable");
        Ok(())
    }
}

impl FullTextService for FullTextRssClient {
    async fn fetch_fulltext(&self, url: &str) -> Result<Extracted, AppError> {
        let request_url = self.request_url(url);

        let response = self.client.get(&request_url).send().await.map_err(|e| {
            AppError::RemoteServiceError(RemoteFailure::NetworkError(e.to_string()))
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(AppError::RemoteServiceError(RemoteFailure::BadStatus(
                status,
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            AppError::RemoteServiceError(RemoteFailure::NetworkError(e.to_string()))
        })?;

        // A body that is not a feed counts as an empty result.
        let first = parse_feed(&body)
            .ok()
            .and_then(|entries| entries.into_iter().next())
            .ok_or(AppError::RemoteServiceError(RemoteFailure::EmptyResult))?;

        if first.description.contains(PLACEHOLDER) {
            return Err(AppError::RemoteServiceError(RemoteFailure::Placeholder));
        }

        Ok(Extracted {
            title: first.title,
            content: first.description,
        })
    }
}
