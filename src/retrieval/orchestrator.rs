//! Search session state machine
//!
//! [`SearchOrchestrator`] owns one [`SearchState`] and drives it through
//! `Idle -> Searching -> Success | Empty | Failed`. It talks to the backend
//! only through [`VideoSearch`], to the result cache, and to listeners over an
//! event channel.
//!
//! Every fresh query (and every reset) bumps a generation counter. Work that
//! started under an older generation discards its result instead of applying
//! it, so a slow response for an abandoned query never overwrites the state of
//! the current one. The state lock is never held across an await.

use crate::client::{FetchError, SearchOptions, VideoSearch};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::filtering::{self, FilterChange, FilterSet, SortKey};
use crate::models::SearchResultPage;
use crate::retrieval::deduplication::merge_unique;
use crate::retrieval::events::{EventSender, SearchEvent};
use crate::retrieval::fallback::{FallbackChain, FallbackState};
use crate::retrieval::retry::{Backoff, RetryExecutor, RetryPolicy};
use crate::retrieval::state::{SearchPhase, SearchState};
use crate::storage::{CachePayload, ResultCache};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Tunables for one orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub page_size: usize,
    pub use_server_cache: bool,
    /// Whether results are read from and written to the [`ResultCache`]
    pub use_result_cache: bool,
    /// Budget for the main fetch and for pagination
    pub retry: RetryPolicy,
    /// Budget for each fallback candidate
    pub fallback: RetryPolicy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: 24,
            use_server_cache: true,
            use_result_cache: true,
            retry: RetryPolicy::new(3, Duration::from_secs(1), Backoff::Constant),
            fallback: RetryPolicy::new(2, Duration::from_secs(1), Backoff::Constant),
        }
    }
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        let delay = |text: &str| crate::duration::to_std(text).unwrap_or(Duration::from_secs(1));

        Self {
            page_size: config.api.page_size,
            use_server_cache: config.api.use_server_cache,
            use_result_cache: config.cache.enabled,
            retry: RetryPolicy::new(
                config.retry.max_attempts,
                delay(&config.retry.base_delay),
                config.retry.backoff,
            ),
            fallback: RetryPolicy::new(
                config.retry.fallback_attempts,
                delay(&config.retry.fallback_delay),
                config.retry.backoff,
            ),
        }
    }
}

/// How a call into the orchestrator ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Blank query, state cleared
    Idle,
    /// Served from the result cache without a network call
    CacheHit { video_count: usize },
    /// A page with results was applied
    Loaded { video_count: usize, has_more: bool },
    /// The original query found nothing but a fallback candidate did
    Recovered { query: String, video_count: usize },
    /// Nothing found, fallback chain exhausted
    Empty,
    /// Pagination reached the last page
    EndOfResults,
    Failed { error: String },
    /// A newer query or a reset replaced this one while it was in flight
    Superseded,
    /// `load_more` was called while busy or with nothing left to load
    Skipped,
}

struct Session {
    state: SearchState,
    filters: FilterSet,
    sort: SortKey,
}

pub struct SearchOrchestrator {
    client: Arc<dyn VideoSearch>,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
    events: Option<EventSender>,
    settings: SearchSettings,
    fallback_chain: FallbackChain,
    generation: AtomicU64,
    session: Mutex<Session>,
}

impl SearchOrchestrator {
    pub fn new(client: Arc<dyn VideoSearch>, cache: ResultCache, settings: SearchSettings) -> Self {
        Self {
            client,
            cache,
            clock: Arc::new(SystemClock),
            events: None,
            settings,
            fallback_chain: FallbackChain::default(),
            generation: AtomicU64::new(0),
            session: Mutex::new(Session {
                state: SearchState::default(),
                filters: FilterSet::default(),
                sort: SortKey::default(),
            }),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_fallback_chain(mut self, chain: FallbackChain) -> Self {
        self.fallback_chain = chain;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SearchState {
        self.lock().state.clone()
    }

    pub fn filters(&self) -> FilterSet {
        self.lock().filters.clone()
    }

    pub fn sort(&self) -> SortKey {
        self.lock().sort
    }

    /// Start a fresh search for `raw_query`
    pub async fn search(&self, raw_query: &str) -> SearchOutcome {
        let query = raw_query.trim().to_string();
        let generation = self.bump_generation();

        if query.is_empty() {
            self.lock().state = SearchState::default();
            tracing::debug!("Ignoring blank query");
            self.emit(SearchEvent::EmptyQuery);
            return SearchOutcome::Idle;
        }

        let normalized = query.clone();
        tracing::info!("Searching for {:?}", query);
        self.lock().state = SearchState::searching(&query, &normalized);

        if self.settings.use_result_cache {
            if let Some(payload) = self.cache.get(&normalized, self.clock.now()) {
                return self.apply_cached(payload);
            }
        }

        let options = SearchOptions::first_page(self.settings.page_size, self.settings.use_server_cache);
        let result = self
            .fetch(generation, &query, &options, &self.settings.retry, true)
            .await;

        if !self.is_current(generation) {
            tracing::debug!("Discarding stale results for {:?}", query);
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(page) if !page.videos.is_empty() => {
                let video_count = self.apply_fresh_page(&query, page);
                let has_more = self.lock().state.has_more;
                SearchOutcome::Loaded {
                    video_count,
                    has_more,
                }
            }
            Ok(_) => {
                tracing::info!("No results for {:?}, trying fallbacks", query);
                self.run_fallback(generation, &query, None).await
            }
            Err(error) if error.is_malformed() => self.fail(&query, &error, false),
            Err(error) => {
                let nothing_shown = self.lock().state.visible_videos.is_empty();
                if nothing_shown {
                    self.run_fallback(generation, &query, Some(error)).await
                } else {
                    self.fail(&query, &error, false)
                }
            }
        }
    }

    /// Fetch the page after the current cursor and append it
    pub async fn load_more(&self) -> SearchOutcome {
        let generation = self.generation.load(Ordering::SeqCst);

        let (query, cursor) = {
            let mut session = self.lock();
            let state = &mut session.state;
            if !state.can_load_more() {
                return SearchOutcome::Skipped;
            }
            state.loading_more = true;
            state.error = None;
            state.phase = SearchPhase::Searching { load_more: true };
            (state.query.clone(), state.cursor.clone())
        };

        tracing::debug!("Loading more results for {:?}", query);
        let options = SearchOptions::first_page(self.settings.page_size, self.settings.use_server_cache)
            .after(cursor);
        let result = self
            .fetch(generation, &query, &options, &self.settings.retry, true)
            .await;

        if !self.is_current(generation) {
            tracing::debug!("Discarding stale page for {:?}", query);
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(page) if !page.videos.is_empty() => {
                let now = self.clock.now();
                let (added, video_count, has_more) = {
                    let mut session = self.lock();
                    let session = &mut *session;
                    let state = &mut session.state;
                    let added = merge_unique(&mut state.all_videos, page.videos);
                    state.cursor = page.next_cursor;
                    state.has_more = state.cursor.is_some();
                    state.loading_more = false;
                    state.phase = SearchPhase::Success;
                    recompute_view(session, now);
                    (added, session.state.all_videos.len(), session.state.has_more)
                };

                tracing::info!("Loaded {} more videos for {:?}", added, query);
                self.emit(SearchEvent::SearchSucceeded {
                    query,
                    video_count,
                    from_cache: false,
                    load_more: true,
                });
                SearchOutcome::Loaded {
                    video_count,
                    has_more,
                }
            }
            Ok(_) => {
                {
                    let mut session = self.lock();
                    let state = &mut session.state;
                    state.cursor = None;
                    state.has_more = false;
                    state.loading_more = false;
                    state.phase = SearchPhase::Success;
                }
                tracing::info!("Reached the end of results for {:?}", query);
                self.emit(SearchEvent::SearchEmpty {
                    query,
                    load_more: true,
                });
                SearchOutcome::EndOfResults
            }
            Err(error) => self.fail(&query, &error, true),
        }
    }

    /// Clear the state and forget the cached results of the current query
    pub fn reset(&self) {
        self.bump_generation();

        let normalized = {
            let mut session = self.lock();
            std::mem::take(&mut session.state).normalized_query
        };

        if !normalized.is_empty() {
            tracing::debug!("Invalidating cached results for {:?}", normalized);
            self.cache.invalidate(&normalized);
        }
    }

    /// Reset, then run the current query again against the backend
    pub async fn refresh(&self) -> SearchOutcome {
        let query = self.lock().state.query.clone();
        self.reset();
        self.search(&query).await
    }

    /// Replace all filters, returning the number of visible videos
    pub fn set_filters(&self, filters: FilterSet) -> usize {
        let now = self.clock.now();
        let mut session = self.lock();
        session.filters = filters;
        recompute_view(&mut session, now);
        session.state.visible_videos.len()
    }

    pub fn apply_filter_change(&self, change: FilterChange) -> usize {
        let filters = self.filters().with_change(change);
        self.set_filters(filters)
    }

    pub fn set_sort(&self, sort: SortKey) -> usize {
        let now = self.clock.now();
        let mut session = self.lock();
        session.sort = sort;
        recompute_view(&mut session, now);
        session.state.visible_videos.len()
    }

    /// Walk the fallback chain for `original`.
    ///
    /// `cause` is the fetch error that led here, if the original query failed
    /// rather than coming back empty.
    async fn run_fallback(
        &self,
        generation: u64,
        original: &str,
        cause: Option<FetchError>,
    ) -> SearchOutcome {
        let mut progress = FallbackState::new(original);
        let mut last_error = cause;

        while let Some(candidate) = self.fallback_chain.try_next(original, &mut progress) {
            self.lock().state.fallback_index = progress.index;

            tracing::info!(
                "Fallback {}/{} ({}): {:?}",
                candidate.position,
                self.fallback_chain.len(),
                candidate.strategy.name(),
                candidate.query
            );
            self.emit(SearchEvent::FallbackAttempted {
                original: original.to_string(),
                candidate: candidate.query.clone(),
                strategy: candidate.strategy.name().to_string(),
                position: candidate.position,
            });

            let options = SearchOptions::first_page(self.settings.page_size, self.settings.use_server_cache);
            let result = self
                .fetch(generation, &candidate.query, &options, &self.settings.fallback, false)
                .await;

            if !self.is_current(generation) {
                return SearchOutcome::Superseded;
            }

            match result {
                Ok(page) if !page.videos.is_empty() => {
                    {
                        let mut session = self.lock();
                        session.state.query = candidate.query.clone();
                        session.state.normalized_query = candidate.query.clone();
                    }
                    let video_count = self.apply_fresh_page(&candidate.query, page);
                    return SearchOutcome::Recovered {
                        query: candidate.query,
                        video_count,
                    };
                }
                Ok(_) => {
                    tracing::debug!("Fallback {:?} found nothing", candidate.query);
                }
                Err(error) if error.is_malformed() => {
                    return self.fail(original, &error, false);
                }
                Err(error) => {
                    tracing::warn!("Fallback {:?} failed: {}", candidate.query, error);
                    last_error = Some(error);
                }
            }
        }

        self.lock().state.fallback_index = progress.index;

        match last_error {
            Some(error) => self.fail(original, &error, false),
            None => {
                {
                    let mut session = self.lock();
                    let state = &mut session.state;
                    state.loading = false;
                    state.has_more = false;
                    state.cursor = None;
                    state.phase = SearchPhase::Empty;
                }
                tracing::info!(
                    "No results for {:?} after {} queries: {:?}",
                    original,
                    progress.attempted().len(),
                    progress.attempted()
                );
                self.emit(SearchEvent::SearchEmpty {
                    query: original.to_string(),
                    load_more: false,
                });
                SearchOutcome::Empty
            }
        }
    }

    /// One page through the retry executor.
    ///
    /// Retries of the main budget (`track_retries`) are recorded in the state.
    /// A superseded generation stops retrying at the next backoff.
    async fn fetch(
        &self,
        generation: u64,
        query: &str,
        options: &SearchOptions,
        policy: &RetryPolicy,
        track_retries: bool,
    ) -> Result<SearchResultPage, FetchError> {
        let executor = RetryExecutor::new(policy.clone());
        let max_attempts = policy.max_attempts.max(1);

        executor
            .execute_while(
                move || self.client.search(query, options),
                move |error: &FetchError, attempt| {
                    if track_retries {
                        self.lock().state.retry_count = attempt;
                    }
                    self.emit(SearchEvent::RetryAttempted {
                        query: query.to_string(),
                        attempt,
                        max_attempts,
                        error: error.to_string(),
                    });
                },
                move || self.is_current(generation),
            )
            .await
    }

    /// Install the first page of a fresh query and cache it under `query`
    fn apply_fresh_page(&self, query: &str, page: SearchResultPage) -> usize {
        let now = self.clock.now();

        let (payload, video_count) = {
            let mut session = self.lock();
            let session = &mut *session;
            let state = &mut session.state;
            merge_unique(&mut state.all_videos, page.videos);
            state.cursor = page.next_cursor;
            state.has_more = state.cursor.is_some();
            state.total_count = page.total_count;
            state.game_meta = page.game_meta;
            state.loading = false;
            state.error = None;
            state.phase = SearchPhase::Success;
            recompute_view(session, now);

            let state = &session.state;
            let payload = CachePayload {
                query: state.query.clone(),
                videos: state.all_videos.clone(),
                cursor: state.cursor.clone(),
                game_meta: state.game_meta.clone(),
                total_count: state.total_count,
            };
            (payload, state.all_videos.len())
        };

        if self.settings.use_result_cache {
            self.cache.put(query, payload, now);
        }

        tracing::info!("Found {} videos for {:?}", video_count, query);
        self.emit(SearchEvent::SearchSucceeded {
            query: query.to_string(),
            video_count,
            from_cache: false,
            load_more: false,
        });
        video_count
    }

    fn apply_cached(&self, payload: CachePayload) -> SearchOutcome {
        let now = self.clock.now();

        let (query, video_count) = {
            let mut session = self.lock();
            let session = &mut *session;
            let state = &mut session.state;
            state.query = payload.query;
            merge_unique(&mut state.all_videos, payload.videos);
            state.has_more = payload.cursor.is_some();
            state.cursor = payload.cursor;
            state.game_meta = payload.game_meta;
            state.total_count = payload.total_count;
            state.loading = false;
            state.phase = SearchPhase::Success;
            recompute_view(session, now);
            (session.state.query.clone(), session.state.all_videos.len())
        };

        tracing::debug!("Served {:?} from cache", query);
        self.emit(SearchEvent::SearchSucceeded {
            query,
            video_count,
            from_cache: true,
            load_more: false,
        });
        SearchOutcome::CacheHit { video_count }
    }

    fn fail(&self, query: &str, error: &FetchError, load_more: bool) -> SearchOutcome {
        let message = error.to_string();

        let video_count = {
            let mut session = self.lock();
            let state = &mut session.state;
            if load_more {
                state.loading_more = false;
            } else {
                state.loading = false;
            }
            state.error = Some(message.clone());
            state.phase = SearchPhase::Failed;
            state.visible_videos.len()
        };

        tracing::warn!("Search for {:?} failed: {}", query, message);
        self.emit(SearchEvent::SearchFailed {
            query: query.to_string(),
            error: message.clone(),
            video_count,
        });
        SearchOutcome::Failed { error: message }
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn emit(&self, event: SearchEvent) {
        if let Some(events) = &self.events {
            // a dropped receiver just means nobody is listening
            let _ = events.send(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn recompute_view(session: &mut Session, now: chrono::DateTime<chrono::Utc>) {
    session.state.visible_videos = filtering::apply(
        &session.state.all_videos,
        &session.filters,
        session.sort,
        now,
    );
}
