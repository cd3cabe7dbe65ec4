//! Fetch collaborator used by the search orchestrator
//!
//! The orchestrator only sees the [`VideoSearch`] trait; [`HttpSearchClient`]
//! is the production implementation talking to the search backend.

mod http;

pub use http::{parse_page, HttpSearchClient};

use crate::models::SearchResultPage;
use crate::retrieval::Retryable;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body had no usable `videos` field
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedResponse(_))
    }
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            FetchError::MalformedResponse(_) => false,
        }
    }
}

/// Request options for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
    /// Cursor of the page to continue from, `None` for the first page
    pub cursor: Option<String>,
    /// Let the backend answer from its own cache
    pub use_cache: bool,
}

impl SearchOptions {
    pub fn first_page(limit: usize, use_cache: bool) -> Self {
        Self {
            limit,
            cursor: None,
            use_cache,
        }
    }

    pub fn after(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// Backend capable of searching videos by game name
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResultPage, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Network("timeout".into()).is_transient());
        assert!(FetchError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(FetchError::Http {
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!FetchError::Http {
            status: 404,
            body: String::new()
        }
        .is_transient());
        assert!(!FetchError::MalformedResponse("no videos".into()).is_transient());
    }
}
