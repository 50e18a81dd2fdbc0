//! Cache-aside storage of resolved entries.
//!
//! Records are JSON documents tagged with [`CACHE_FORMAT_VERSION`]. A record
//! written by a different version decodes as a miss instead of being trusted.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::ResolvedEntry;
use crate::traits::CacheStore;

pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Default number of records kept by [`MokaCacheStore`].
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Cache key for an article link.
pub fn cache_key(link: &str) -> String {
    format!("hnfeeds:v{CACHE_FORMAT_VERSION}:{link}")
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    entry: ResolvedEntry,
}

/// Serialize an entry into its cache record.
pub fn encode_entry(entry: &ResolvedEntry) -> Result<Vec<u8>, AppError> {
    let record = CacheRecord {
        version: CACHE_FORMAT_VERSION,
        entry: entry.clone(),
    };
    Ok(serde_json::to_vec(&record)?)
}

/// Decode a cache record. `Ok(None)` means the record is from another format
/// version and must be recomputed.
pub fn decode_entry(bytes: &[u8]) -> Result<Option<ResolvedEntry>, AppError> {
    let record: CacheRecord = serde_json::from_slice(bytes)?;
    if record.version != CACHE_FORMAT_VERSION {
        return Ok(None);
    }
    Ok(Some(record.entry))
}

#[derive(Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    ttl: Duration,
}

/// Expires each record after the TTL it was written with.
struct PerRecordTtl;

impl Expiry<String, StoredValue> for PerRecordTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`CacheStore`] backed by moka.
///
/// Cheap to clone; clones share the same underlying cache, so a single
/// instance built at startup serves every worker.
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<String, StoredValue>,
}

impl MokaCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerRecordTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.cache.get(key).await.map(|v| v.bytes))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), AppError> {
        self.cache
            .insert(key.to_string(), StoredValue { bytes: value, ttl })
            .await;
        Ok(())
    }
}

/// Read-through lookup. Every failure (I/O, undecodable or foreign-version
/// record) is logged and reported as a miss.
pub async fn lookup<C: CacheStore>(cache: &C, link: &str) -> Option<ResolvedEntry> {
    let bytes = match cache.get(&cache_key(link)).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::debug!(url = %link, "Cache miss");
            return None;
        }
        Err(e) => {
            tracing::warn!(url = %link, error = %e, "Cache read failed, treating as miss");
            return None;
        }
    };

    match decode_entry(&bytes) {
        Ok(Some(entry)) => {
            tracing::debug!(url = %link, "Cache hit");
            Some(entry)
        }
        Ok(None) => {
            tracing::debug!(url = %link, "Cache record from another format version");
            None
        }
        Err(e) => {
            tracing::warn!(url = %link, error = %e, "Undecodable cache record, treating as miss");
            None
        }
    }
}

/// Write-through store. Failures are logged and swallowed.
pub async fn store<C: CacheStore>(cache: &C, entry: &ResolvedEntry, ttl: Duration) {
    let bytes = match encode_entry(entry) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %entry.link, error = %e, "Failed to encode cache record");
            return;
        }
    };

    if let Err(e) = cache.set(&cache_key(&entry.link), bytes, ttl).await {
        tracing::warn!(url = %entry.link, error = %e, "Cache write failed");
    }
}
