use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use hnfeeds_core::error::AppError;
use hnfeeds_core::models::FetchOutcome;
use hnfeeds_core::rules::SiteRules;
use hnfeeds_core::traits::PageFetcher;
use reqwest::Client;
use reqwest::header::{COOKIE, USER_AGENT};

use crate::user_agent::UserAgentPool;

/// HTTP page fetcher using reqwest.
///
/// Every request carries a User-Agent drawn from the pool and, when a cookie
/// rule matches the URL, that site's cookies. A single GET, never retried.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    agents: UserAgentPool,
    rules: Arc<SiteRules>,
}

impl ReqwestFetcher {
    pub fn with_timeout(timeout: Duration, rules: Arc<SiteRules>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            agents: UserAgentPool::default(),
            rules,
        })
    }

    pub fn with_user_agents(mut self, agents: UserAgentPool) -> Self {
        self.agents = agents;
        self
    }
}

impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut request = self.client.get(url).header(USER_AGENT, self.agents.pick());
        if let Some(cookies) = self.rules.cookies_for(url) {
            request = request.header(COOKIE, cookie_header(cookies));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return failed(e),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::HttpError(status.as_u16());
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                status: status.as_u16(),
            },
            Err(e) => failed(e),
        }
    }
}

fn failed(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::NetworkError(format!("Connection failed: {e}"))
    } else {
        FetchOutcome::NetworkError(e.to_string())
    }
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
