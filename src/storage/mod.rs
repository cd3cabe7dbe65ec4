//! Storage layer for vodseek
//!
//! A small persisted key/value capability with an in-memory and a SQLite
//! implementation, and the search result cache built on top of it.

pub mod cache;
pub mod database;

use crate::error::Result;
use ahash::AHashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

pub use cache::{CacheEntry, CachePayload, ResultCache, CACHE_KEY_PREFIX, DEFAULT_TTL};
pub use database::{SqliteStore, StoreStats};

/// Fallible string key/value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, in no particular order
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Process-local store, used when nothing persistent is available
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<AHashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Open the SQLite store under `data_dir`.
///
/// Returns `None` (after logging) when the database cannot be opened, so
/// callers fall back to in-memory storage instead of failing.
pub fn open_persistent_store(data_dir: &Path, max_entry_size: u64) -> Option<Arc<SqliteStore>> {
    let db_path = data_dir.join("store").join("cache.sqlite");
    match SqliteStore::new(&db_path, max_entry_size) {
        Ok(store) => {
            tracing::debug!("Persistent store opened at {}", db_path.display());
            Some(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!(
                "Persistent store unavailable at {}, using memory: {}",
                db_path.display(),
                e
            );
            None
        }
    }
}

/// Parse size strings like `"5MB"`, `"512KB"` or `"1024"` into bytes
pub fn parse_size(text: &str) -> Option<u64> {
    let upper = text.trim().to_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Format size as human-readable string
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set("videoSearchCache_a", "1").unwrap();
        store.set("videoSearchCache_b", "2").unwrap();
        store.set("searchHistory", "[]").unwrap();

        assert_eq!(store.get("videoSearchCache_a").unwrap().as_deref(), Some("1"));
        let mut keys = store.keys("videoSearchCache_").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["videoSearchCache_a", "videoSearchCache_b"]);

        store.remove("videoSearchCache_a").unwrap();
        assert!(store.get("videoSearchCache_a").unwrap().is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("5MB"), Some(5 * 1024 * 1024));
        assert_eq!(parse_size("512kb"), Some(512 * 1024));
        assert_eq!(parse_size("100B"), Some(100));
        assert_eq!(parse_size("2048"), Some(2048));
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_open_persistent_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_persistent_store(temp_dir.path(), 1024).unwrap();
        store.set("k", "v").unwrap();
        assert!(temp_dir.path().join("store/cache.sqlite").exists());
    }

    #[test]
    fn test_open_persistent_store_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        // a regular file where the store directory should go
        std::fs::write(temp_dir.path().join("store"), b"not a directory").unwrap();
        assert!(open_persistent_store(temp_dir.path(), 1024).is_none());
    }
}
