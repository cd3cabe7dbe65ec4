//! Search history and favourite games
//!
//! Both lists are persisted as JSON under fixed keys of a [`KeyValueStore`].
//! Persistence problems are logged; the in-memory lists stay authoritative.

use crate::clock::Clock;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const HISTORY_KEY: &str = "searchHistory";
pub const FAVORITES_KEY: &str = "favoriteGames";

/// Default number of remembered queries
pub const DEFAULT_MAX_ITEMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// User preferences backed by a key/value store
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    max_items: usize,
    history: Vec<HistoryEntry>,
    favorites: Vec<String>,
}

impl Preferences {
    /// Load both lists from `store`. Unreadable values start out empty.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, max_items: usize) -> Self {
        let history = load_list(store.as_ref(), HISTORY_KEY);
        let favorites = load_list(store.as_ref(), FAVORITES_KEY);

        let mut prefs = Self {
            store,
            clock,
            max_items: max_items.max(1),
            history,
            favorites,
        };
        prefs.history.truncate(prefs.max_items);
        prefs
    }

    /// Most recent first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    /// Put `query` at the front, dropping an older copy and the overflow
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.history.retain(|entry| entry.query != query);
        self.history.insert(
            0,
            HistoryEntry {
                query: query.to_string(),
                timestamp: self.clock.now().timestamp_millis(),
            },
        );
        self.history.truncate(self.max_items);
        self.save();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.save();
    }

    /// Add or remove `game`, returning whether it is now a favourite
    pub fn toggle_favorite(&mut self, game: &str) -> bool {
        let now_favorite = match self.favorites.iter().position(|g| g == game) {
            Some(index) => {
                self.favorites.remove(index);
                false
            }
            None => {
                self.favorites.push(game.to_string());
                true
            }
        };
        self.save();
        now_favorite
    }

    pub fn is_favorite(&self, game: &str) -> bool {
        self.favorites.iter().any(|g| g == game)
    }

    fn save(&self) {
        save_list(self.store.as_ref(), HISTORY_KEY, &self.history);
        save_list(self.store.as_ref(), FAVORITES_KEY, &self.favorites);
    }
}

fn load_list<T: for<'de> Deserialize<'de>>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    match store.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable {}: {}", key, e);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to load {}: {}", key, e);
            Vec::new()
        }
    }
}

fn save_list<T: Serialize>(store: &dyn KeyValueStore, key: &str, items: &[T]) {
    let raw = match serde_json::to_string(items) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Failed to serialize {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = store.set(key, &raw) {
        tracing::warn!("Failed to save {}: {}", key, e);
    }
}
