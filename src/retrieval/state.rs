//! Mutable aggregate owned by the search orchestrator

use crate::models::{GameMeta, VideoRecord};
use serde::Serialize;

/// Where the orchestrator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching {
        load_more: bool,
    },
    Success,
    Empty,
    Failed,
}

/// Snapshot of one search session
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchState {
    /// Active query as typed, or the fallback candidate that replaced it
    pub query: String,
    pub normalized_query: String,
    /// Every page received so far, unique by id
    pub all_videos: Vec<VideoRecord>,
    /// `all_videos` after the current filters and sort
    pub visible_videos: Vec<VideoRecord>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    /// Retries spent from the main budget by the latest fetch
    pub retry_count: u32,
    /// Strategies consumed by the fallback chain for this query
    pub fallback_index: usize,
    pub phase: SearchPhase,
    pub game_meta: Option<GameMeta>,
    pub total_count: u64,
}

impl SearchState {
    /// Fresh state for a new query, already marked as loading
    pub fn searching(query: &str, normalized_query: &str) -> Self {
        Self {
            query: query.to_string(),
            normalized_query: normalized_query.to_string(),
            loading: true,
            phase: SearchPhase::Searching { load_more: false },
            ..Self::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        self.loading || self.loading_more
    }

    /// Whether `load_more` would issue a request
    pub fn can_load_more(&self) -> bool {
        !self.is_busy() && self.has_more && !self.normalized_query.is_empty()
    }
}
