use std::sync::Arc;

use hnfeeds_core::error::AppError;
use rand::seq::SliceRandom;

/// Desktop Chrome on Windows, Linux and macOS.
const CHROME_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

/// Pool of User-Agent strings, one drawn at random per request.
///
/// Built once and shared; cloning only bumps a reference count.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Arc<[String]>,
}

impl UserAgentPool {
    pub fn new(agents: Vec<String>) -> Result<Self, AppError> {
        if agents.is_empty() {
            return Err(AppError::ConfigError(
                "User-Agent pool must not be empty".to_string(),
            ));
        }
        Ok(Self {
            agents: agents.into(),
        })
    }

    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(CHROME_AGENTS[0])
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: CHROME_AGENTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_is_chrome_on_desktop() {
        let pool = UserAgentPool::default();
        assert!(!pool.is_empty());
        for _ in 0..50 {
            let agent = pool.pick();
            assert!(agent.contains("Chrome/"));
            assert!(
                agent.contains("Windows") || agent.contains("Linux") || agent.contains("Mac OS X")
            );
        }
    }

    #[test]
    fn test_custom_pool() {
        let pool = UserAgentPool::new(vec!["only-agent".into()]).unwrap();
        assert_eq!(pool.pick(), "only-agent");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            UserAgentPool::new(Vec::new()),
            Err(AppError::ConfigError(_))
        ));
    }
}
