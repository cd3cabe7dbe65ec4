//! vodseek - game video search with retries, query fallbacks and a result cache
//!
//! The [`retrieval::SearchOrchestrator`] drives a search session: it fetches
//! pages through a [`client::VideoSearch`] backend, retries transient
//! failures, tries alternate spellings when a query finds nothing, merges
//! pages without duplicates and keeps recent results in a
//! [`storage::ResultCache`]. The filtered and sorted view is recomputed by
//! [`filtering::apply`] whenever results or view settings change.

pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod filtering;
pub mod history;
pub mod models;
pub mod retrieval;
pub mod storage;

pub use error::{Result, VodseekError};
