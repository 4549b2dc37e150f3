use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::Mutex;

use crate::core::breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker};
use crate::error::MatchFeedError;
use crate::models::{
    CacheStats, CandidateProfile, FetchFilters, MatchPage, MatchQueryRequest, SwipeKind,
    SwipeResponse,
};
use crate::services::analytics::AnalyticsSink;
use crate::services::api::MatchApi;
use crate::services::swipes::SwipeRecorder;

/// Feed-level tuning knobs.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub breaker: BreakerConfig,
    /// Page size used by background preloads.
    pub preload_batch: u16,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            breaker: BreakerConfig::default(),
            preload_batch: 3,
        }
    }
}

/// Explicit load phase, replacing an is_loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedPhase {
    Idle,
    Loading,
    Ready,
}

type PreloadFuture = Shared<BoxFuture<'static, ()>>;

/// Cursor, filter, and cache bookkeeping for one feed session.
struct FeedState {
    entries: HashMap<String, CandidateProfile>,
    /// Insertion order of `entries`, for deterministic iteration.
    order: Vec<String>,
    viewed: HashSet<String>,
    filters: Option<FetchFilters>,
    next_cursor: Option<String>,
    last_load: Option<DateTime<Utc>>,
    phase: FeedPhase,
    /// Bumped on every clear; in-flight fetches from a previous epoch
    /// discard their results instead of repopulating a cleared cache.
    epoch: u64,
    preload: Option<PreloadFuture>,
}

impl FeedState {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            viewed: HashSet::new(),
            filters: None,
            next_cursor: None,
            last_load: None,
            phase: FeedPhase::Idle,
            epoch: 0,
            preload: None,
        }
    }

    fn insert_new(&mut self, candidate: &CandidateProfile) -> bool {
        if self.entries.contains_key(&candidate.id) {
            return false;
        }
        self.entries
            .insert(candidate.id.clone(), candidate.clone());
        self.order.push(candidate.id.clone());
        true
    }
}

struct FeedInner {
    api: Arc<dyn MatchApi>,
    breaker: CircuitBreaker,
    swipes: SwipeRecorder,
    preload_batch: u16,
    state: Mutex<FeedState>,
}

/// In-memory candidate cache with cursor pagination, a breaker-gated
/// fetch path, and a single-flight preloader.
///
/// Cheap to clone; all clones share one cache. Everything is
/// session-scoped and in-memory: `clear_cache`/`cleanup` discard the lot.
#[derive(Clone)]
pub struct MatchFeed {
    inner: Arc<FeedInner>,
}

impl MatchFeed {
    pub fn new(
        api: Arc<dyn MatchApi>,
        analytics: Arc<dyn AnalyticsSink>,
        config: FeedConfig,
    ) -> Self {
        let swipes = SwipeRecorder::new(Arc::clone(&api), analytics);
        Self {
            inner: Arc::new(FeedInner {
                api,
                breaker: CircuitBreaker::new(config.breaker),
                swipes,
                preload_batch: config.preload_batch,
                state: Mutex::new(FeedState::new()),
            }),
        }
    }

    pub(crate) fn api(&self) -> Arc<dyn MatchApi> {
        Arc::clone(&self.inner.api)
    }

    /// Discard any previous session contents and load the first page for
    /// the given filters.
    ///
    /// Errors with `Validation` if a load is already in flight.
    pub async fn load_initial_matches(
        &self,
        filters: FetchFilters,
    ) -> Result<Vec<CandidateProfile>, MatchFeedError> {
        filters.check()?;

        let (epoch, query) = {
            let mut state = self.inner.state.lock().await;
            if state.phase == FeedPhase::Loading {
                return Err(MatchFeedError::Validation(
                    "a load is already in progress".to_string(),
                ));
            }
            state.phase = FeedPhase::Loading;
            state.epoch += 1;
            state.entries.clear();
            state.order.clear();
            state.viewed.clear();
            state.next_cursor = None;
            state.last_load = None;
            state.preload = None;
            let query = MatchQueryRequest::from_filters(&filters, filters.limit, None, vec![]);
            state.filters = Some(filters);
            (state.epoch, query)
        };

        let api = self.api();
        let result = self
            .inner
            .breaker
            .execute_with_fallback(
                || async move { api.fetch_candidates(&query).await },
                MatchPage::default,
            )
            .await;

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!("discarding initial batch from a superseded load");
            return Ok(vec![]);
        }
        match result {
            Ok(page) => {
                for candidate in &page.data {
                    state.insert_new(candidate);
                }
                state.next_cursor = page.pagination.next_cursor.clone();
                state.last_load = Some(Utc::now());
                state.phase = FeedPhase::Ready;
                tracing::info!(
                    "initial match batch loaded: {} candidates, more available: {}",
                    page.data.len(),
                    state.next_cursor.is_some()
                );
                Ok(page.data)
            }
            Err(e) => {
                state.phase = FeedPhase::Idle;
                Err(e)
            }
        }
    }

    /// Fetch the next page for the active filters.
    ///
    /// Returns `[]` without touching the network when there is no active
    /// filter set, no further pages, or another fetch is already in
    /// flight.
    pub async fn get_next_matches(
        &self,
        limit: u16,
    ) -> Result<Vec<CandidateProfile>, MatchFeedError> {
        let (epoch, query) = {
            let mut state = self.inner.state.lock().await;
            let filters = match &state.filters {
                Some(f) => f.clone(),
                None => return Ok(vec![]),
            };
            let cursor = match &state.next_cursor {
                Some(c) => c.clone(),
                None => return Ok(vec![]),
            };
            if state.phase == FeedPhase::Loading {
                tracing::debug!("fetch already in flight, skipping pagination call");
                return Ok(vec![]);
            }
            state.phase = FeedPhase::Loading;
            let exclude: Vec<String> = state.viewed.iter().cloned().collect();
            let query = MatchQueryRequest::from_filters(&filters, limit, Some(cursor), exclude);
            (state.epoch, query)
        };

        let api = self.api();
        let result = self
            .inner
            .breaker
            .execute_with_fallback(
                || async move { api.fetch_candidates(&query).await },
                MatchPage::default,
            )
            .await;

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!("discarding paginated batch fetched for a cleared cache");
            return Ok(vec![]);
        }
        match result {
            Ok(page) => {
                let batch = page.data;
                for candidate in &batch {
                    state.insert_new(candidate);
                }
                // A short or empty page means the feed is exhausted.
                state.next_cursor = if batch.is_empty() || batch.len() < limit as usize {
                    None
                } else {
                    page.pagination.next_cursor
                };
                state.last_load = Some(Utc::now());
                state.phase = FeedPhase::Ready;
                tracing::debug!(
                    "merged {} paginated candidates, more available: {}",
                    batch.len(),
                    state.next_cursor.is_some()
                );
                Ok(batch)
            }
            Err(e) => {
                state.phase = FeedPhase::Ready;
                Err(e)
            }
        }
    }

    /// Warm the cache with the next page in the background.
    ///
    /// Single-flight: concurrent callers share one underlying fetch, and
    /// the fetched candidates only ever land in the cache (the result is
    /// discarded).
    pub async fn preload_next_batch(&self) {
        let fut = {
            let mut state = self.inner.state.lock().await;
            if state.next_cursor.is_none() {
                return;
            }
            match &state.preload {
                Some(fut) => fut.clone(),
                None => {
                    let feed = self.clone();
                    let batch = self.inner.preload_batch;
                    let fut: PreloadFuture = async move {
                        if let Err(e) = feed.get_next_matches(batch).await {
                            tracing::debug!("preload fetch failed: {}", e);
                        }
                        feed.inner.state.lock().await.preload = None;
                    }
                    .boxed()
                    .shared();
                    state.preload = Some(fut.clone());
                    fut
                }
            }
        };
        fut.await;
    }

    /// Record a swipe decision.
    ///
    /// The candidate is marked viewed before the network call so that
    /// viewed-state stays correct even when the post fails.
    pub async fn record_swipe(
        &self,
        id: &str,
        kind: SwipeKind,
    ) -> Result<SwipeResponse, MatchFeedError> {
        if id.trim().is_empty() {
            return Err(MatchFeedError::Validation(
                "swiped id must not be empty".to_string(),
            ));
        }
        {
            let mut state = self.inner.state.lock().await;
            state.viewed.insert(id.to_string());
        }
        self.inner.swipes.record(id, kind).await
    }

    pub async fn has_been_viewed(&self, id: &str) -> bool {
        self.inner.state.lock().await.viewed.contains(id)
    }

    pub async fn has_more_matches(&self) -> bool {
        self.inner.state.lock().await.next_cursor.is_some()
    }

    /// Cached candidates in insertion order.
    pub async fn cached_candidates(&self) -> Vec<CandidateProfile> {
        let state = self.inner.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|id| state.entries.get(id).cloned())
            .collect()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let state = self.inner.state.lock().await;
        CacheStats {
            cache_size: state.entries.len(),
            viewed_count: state.viewed.len(),
            has_more: state.next_cursor.is_some(),
            last_load_time: state.last_load,
        }
    }

    /// Drop all cached candidates, viewed ids, filters, and cursor state.
    pub async fn clear_cache(&self) {
        let mut state = self.inner.state.lock().await;
        state.epoch += 1;
        state.entries.clear();
        state.order.clear();
        state.viewed.clear();
        state.filters = None;
        state.next_cursor = None;
        state.last_load = None;
        state.phase = FeedPhase::Idle;
        state.preload = None;
        tracing::debug!("match cache cleared");
    }

    /// Session teardown.
    pub async fn cleanup(&self) {
        self.clear_cache().await;
    }

    pub async fn circuit_state(&self) -> BreakerSnapshot {
        self.inner.breaker.snapshot().await
    }
}
