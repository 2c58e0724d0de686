//! In-memory response cache shared by the requests of one process
//!
//! Entries are only ever written after a successful upstream fetch and are
//! never evicted. Reads and writes hold the lock briefly and never across an
//! upstream call, so two requests that miss the same key both refresh it and
//! the last successful write wins.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// A cached upstream body
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Upstream body exactly as received
    pub body: Bytes,
    /// When the body was fetched
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Age of the entry relative to `now`, floored at zero
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// True while the entry is younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

/// Keyed store of upstream bodies with a fixed time-to-live
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the entry for `key` regardless of age
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    /// Returns the entry for `key` only if it is still fresh at `now`
    pub async fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        self.get(key)
            .await
            .filter(|entry| entry.is_fresh(self.ttl, now))
    }

    /// Stores `body` for `key`, replacing any previous entry
    pub async fn store(&self, key: &str, body: Bytes, stored_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry { body, stored_at });
        tracing::debug!(key, size = entries.len(), "Cached upstream body");
    }

    /// Number of entries, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of entries still fresh at `now`
    pub async fn fresh_count(&self, now: DateTime<Utc>) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .count()
    }
}
