use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::AppError;
use crate::quality::{DEFAULT_CHALLENGE_PHRASES, DEFAULT_MAX_UNWRAPPED_LEN, QualityGates};

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60 * 24 * 2;

/// Runtime options of the resolution pipeline.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Timeout of a single page fetch.
    pub fetch_timeout: Duration,
    /// Upper bound on entries resolved at the same time.
    pub max_workers: usize,
    /// Lifetime of a cached resolved entry.
    pub cache_ttl: Duration,
    /// Capacity of the in-process cache; `0` disables caching.
    pub cache_capacity: u64,
    /// Base URL of a full-text-rss deployment. `None` disables the remote strategy.
    pub fulltext_url: Option<String>,
    /// JSON file replacing the built-in domain rules.
    pub rules_path: Option<PathBuf>,
    /// Page titles containing any of these mark a bot-check page.
    pub challenge_phrases: Vec<String>,
    /// Extractions longer than this must come as a single `<body>` wrapper.
    pub max_unwrapped_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_workers: DEFAULT_MAX_WORKERS,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            fulltext_url: None,
            rules_path: None,
            challenge_phrases: default_challenge_phrases(),
            max_unwrapped_len: DEFAULT_MAX_UNWRAPPED_LEN,
        }
    }
}

impl ResolverConfig {
    /// Read configuration from environment variables.
    ///
    /// - `TIMEOUT_SECS` (default 5)
    /// - `MAX_WORKERS` (default 5, at least 1)
    /// - `CACHE_EXPIRE_SECS`, falling back to `REDIS_EXPIRE_SECS` (default 172800)
    /// - `CACHE_CAPACITY` (default 10000, 0 disables caching)
    /// - `FULLTEXT_RSS_URL` (optional)
    /// - `HNFEEDS_RULES` (optional path to a rules JSON file)
    /// - `CHALLENGE_PHRASES` (`|`-separated, default `Are you a robot?`)
    /// - `MAX_UNWRAPPED_LEN` (default 1000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let timeout_secs = parse_var(&lookup, "TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "TIMEOUT_SECS must be at least 1".into(),
            ));
        }

        let max_workers = parse_var(&lookup, "MAX_WORKERS", DEFAULT_MAX_WORKERS)?;
        if max_workers == 0 {
            return Err(AppError::ConfigError(
                "MAX_WORKERS must be at least 1".into(),
            ));
        }

        let ttl_var = if lookup("CACHE_EXPIRE_SECS").is_some() {
            "CACHE_EXPIRE_SECS"
        } else {
            "REDIS_EXPIRE_SECS"
        };
        let cache_ttl_secs = parse_var(&lookup, ttl_var, DEFAULT_CACHE_TTL_SECS)?;
        let cache_capacity = parse_var(&lookup, "CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?;

        let fulltext_url = lookup("FULLTEXT_RSS_URL").filter(|url| !url.trim().is_empty());
        let rules_path = lookup("HNFEEDS_RULES")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let challenge_phrases = match lookup("CHALLENGE_PHRASES") {
            Some(raw) => raw
                .split('|')
                .map(str::trim)
                .filter(|phrase| !phrase.is_empty())
                .map(str::to_string)
                .collect(),
            None => default_challenge_phrases(),
        };
        let max_unwrapped_len =
            parse_var(&lookup, "MAX_UNWRAPPED_LEN", DEFAULT_MAX_UNWRAPPED_LEN)?;

        Ok(Self {
            fetch_timeout: Duration::from_secs(timeout_secs),
            max_workers,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_capacity,
            fulltext_url,
            rules_path,
            challenge_phrases,
            max_unwrapped_len,
        })
    }

    /// Budget of one entry's whole resolution: 1.5 × the fetch timeout.
    pub fn per_entry_timeout(&self) -> Duration {
        self.fetch_timeout.mul_f64(1.5)
    }

    /// Quality gates for local extractions.
    pub fn quality_gates(&self) -> QualityGates {
        QualityGates::new(self.challenge_phrases.clone(), self.max_unwrapped_len)
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_fulltext_url(mut self, url: impl Into<String>) -> Self {
        self.fulltext_url = Some(url.into());
        self
    }
}

fn default_challenge_phrases() -> Vec<String> {
    DEFAULT_CHALLENGE_PHRASES
        .iter()
        .map(|phrase| phrase.to_string())
        .collect()
}

fn parse_var<L, T>(lookup: &L, name: &str, default: T) -> Result<T, AppError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {name} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}
