//! Time-limited cache of accumulated search results
//!
//! Entries live in a [`KeyValueStore`] under `videoSearchCache_<query>` as
//! JSON. Every failure on this path is logged and swallowed: a broken cache
//! only ever costs a network round trip.

use crate::models::{GameMeta, VideoRecord};
use crate::storage::{KeyValueStore, MemoryStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Prefix shared by every cache key
pub const CACHE_KEY_PREFIX: &str = "videoSearchCache_";

/// Default entry lifetime (15 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// What the orchestrator hands to the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePayload {
    pub query: String,
    pub videos: Vec<VideoRecord>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub game_meta: Option<GameMeta>,
    #[serde(default)]
    pub total_count: u64,
}

/// Stored form of a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub payload: CachePayload,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    ttl: chrono::Duration,
}

impl ResultCache {
    /// Cache over `store`, or over a fresh [`MemoryStore`] when `None`
    pub fn new(store: Option<Arc<dyn KeyValueStore>>, ttl: Duration) -> Self {
        let store = store.unwrap_or_else(|| {
            tracing::debug!("No persistent store, caching results in memory");
            Arc::new(MemoryStore::new())
        });
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| {
            tracing::warn!("Cache TTL out of range, using default");
            chrono::Duration::minutes(15)
        });

        Self { store, ttl }
    }

    pub fn in_memory() -> Self {
        Self::new(None, DEFAULT_TTL)
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn key_for(normalized_query: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, normalized_query)
    }

    /// Unexpired entry for `normalized_query`.
    ///
    /// Corrupt and expired entries are removed on the way out.
    pub fn get(&self, normalized_query: &str, now: DateTime<Utc>) -> Option<CachePayload> {
        let key = Self::key_for(normalized_query);

        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Cache read failed for {:?}: {}", normalized_query, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Dropping corrupt cache entry {:?}: {}", normalized_query, e);
                self.remove_quietly(&key);
                return None;
            }
        };

        if entry.is_expired(now) {
            tracing::debug!("Cache entry {:?} expired at {}", normalized_query, entry.expires_at);
            self.remove_quietly(&key);
            return None;
        }

        tracing::debug!(
            "Cache hit for {:?} ({} videos)",
            normalized_query,
            entry.payload.videos.len()
        );
        Some(entry.payload)
    }

    /// Store `payload`, replacing any previous entry. Never fails.
    pub fn put(&self, normalized_query: &str, payload: CachePayload, now: DateTime<Utc>) {
        let entry = CacheEntry {
            payload,
            stored_at: now,
            expires_at: now + self.ttl,
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {:?}: {}", normalized_query, e);
                return;
            }
        };

        match self.store.set(&Self::key_for(normalized_query), &raw) {
            Ok(()) => tracing::debug!(
                "Cached {} videos for {:?}",
                entry.payload.videos.len(),
                normalized_query
            ),
            Err(e) => tracing::warn!("Failed to cache results for {:?}: {}", normalized_query, e),
        }
    }

    pub fn invalidate(&self, normalized_query: &str) {
        self.remove_quietly(&Self::key_for(normalized_query));
    }

    /// Remove every cache entry, returning how many were removed
    pub fn clear(&self) -> usize {
        let keys = self.cache_keys();
        for key in &keys {
            self.remove_quietly(key);
        }
        keys.len()
    }

    /// Remove expired and unreadable entries
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;

        for key in self.cache_keys() {
            let stale = match self.store.get(&key) {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                    Ok(entry) => entry.is_expired(now),
                    Err(_) => true,
                },
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!("Cache read failed for {}: {}", key, e);
                    false
                }
            };

            if stale {
                self.remove_quietly(&key);
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::info!("Purged {} stale cache entries", purged);
        }
        purged
    }

    fn cache_keys(&self) -> Vec<String> {
        self.store.keys(CACHE_KEY_PREFIX).unwrap_or_else(|e| {
            tracing::warn!("Failed to list cache entries: {}", e);
            Vec::new()
        })
    }

    fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!("Failed to remove cache entry {}: {}", key, e);
        }
    }
}
