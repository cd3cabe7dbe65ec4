// Notifications emitted by the orchestrator for the presentation layer

use serde::Serialize;
use tokio::sync::mpsc;

/// Named search lifecycle events. Payloads carry data only; wording is up to
/// whoever renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SearchEvent {
    /// Blank input, nothing was searched
    EmptyQuery,
    RetryAttempted {
        query: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    FallbackAttempted {
        original: String,
        candidate: String,
        strategy: String,
        position: usize,
    },
    SearchSucceeded {
        query: String,
        video_count: usize,
        from_cache: bool,
        load_more: bool,
    },
    SearchEmpty {
        query: String,
        load_more: bool,
    },
    SearchFailed {
        query: String,
        error: String,
        video_count: usize,
    },
}

impl SearchEvent {
    /// Event name as published to listeners
    pub fn name(&self) -> &'static str {
        match self {
            SearchEvent::EmptyQuery => "empty-query",
            SearchEvent::RetryAttempted { .. } => "retry-attempted",
            SearchEvent::FallbackAttempted { .. } => "fallback-attempted",
            SearchEvent::SearchSucceeded { .. } => "search-succeeded",
            SearchEvent::SearchEmpty { .. } => "search-empty",
            SearchEvent::SearchFailed { .. } => "search-failed",
        }
    }
}

/// Sending half handed to the orchestrator
pub type EventSender = mpsc::UnboundedSender<SearchEvent>;

/// Receiving half kept by the presentation layer
pub type EventReceiver = mpsc::UnboundedReceiver<SearchEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
