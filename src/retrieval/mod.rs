//! Search orchestration
//!
//! Retry, fallback and deduplication building blocks, plus the
//! [`SearchOrchestrator`] state machine that ties them to the fetch client and
//! the result cache.

mod deduplication;
mod events;
mod fallback;
mod orchestrator;
mod retry;
mod state;

pub use deduplication::merge_unique;
pub use events::{event_channel, EventReceiver, EventSender, SearchEvent};
pub use fallback::{FallbackCandidate, FallbackChain, FallbackState, FallbackStrategy};
pub use orchestrator::{SearchOrchestrator, SearchOutcome, SearchSettings};
pub use retry::{Backoff, RetryExecutor, RetryPolicy, Retryable};
pub use state::{SearchPhase, SearchState};
