// Unit tests for Lume Feed: cache, pagination, preload, and breaker behavior

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use lume_feed::models::{
    ConfirmMatchRequest, ConfirmMatchResponse, MatchCreation, MatchDetails, MatchPage,
    MatchQueryRequest, PageInfo, SwipeReceipt, SwipeRequest, SwipeResponse,
};
use lume_feed::{
    CandidateProfile, CircuitState, FeedConfig, FetchFilters, MatchApi, MatchFeed, MatchFeedError,
    NetworkFailure, SwipeKind, TracingAnalytics,
};

fn candidate(id: &str) -> CandidateProfile {
    CandidateProfile {
        id: id.to_string(),
        display_name: Some(format!("User {}", id)),
        avatar_url: None,
        bio: None,
        age: Some(27),
        interests: vec!["tennis".to_string()],
        traits: vec![],
        zodiac_sign: Some("Leo".to_string()),
        compatibility_score: Some(82.5),
        distance_km: Some(4.2),
        date_activity: None,
        is_match_recommended: Some(true),
    }
}

fn page(ids: &[&str], cursor: Option<&str>) -> MatchPage {
    MatchPage {
        data: ids.iter().map(|id| candidate(id)).collect(),
        pagination: PageInfo {
            next_cursor: cursor.map(|c| c.to_string()),
        },
    }
}

fn network_failed() -> MatchFeedError {
    MatchFeedError::Network {
        kind: NetworkFailure::Failed,
        message: "fetch candidates: server returned status 500".to_string(),
    }
}

/// Backend stub that serves a script of fetch results and records every
/// query it receives.
struct ScriptedApi {
    pages: Mutex<VecDeque<Result<MatchPage, MatchFeedError>>>,
    queries: Mutex<Vec<MatchQueryRequest>>,
    fetch_calls: AtomicUsize,
    swipe_calls: AtomicUsize,
    fail_swipes: bool,
    /// When set, fetches block until notified (for re-entrancy tests).
    gate: Option<Arc<Notify>>,
}

impl ScriptedApi {
    fn new(pages: Vec<Result<MatchPage, MatchFeedError>>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            queries: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            swipe_calls: AtomicUsize::new(0),
            fail_swipes: false,
            gate: None,
        })
    }

    fn failing_swipes(pages: Vec<Result<MatchPage, MatchFeedError>>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            queries: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            swipe_calls: AtomicUsize::new(0),
            fail_swipes: true,
            gate: None,
        })
    }

    fn gated(pages: Vec<Result<MatchPage, MatchFeedError>>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            queries: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            swipe_calls: AtomicUsize::new(0),
            fail_swipes: false,
            gate: Some(gate),
        })
    }

    fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatchApi for ScriptedApi {
    async fn fetch_candidates(
        &self,
        query: &MatchQueryRequest,
    ) -> Result<MatchPage, MatchFeedError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().await.push(query.clone());
        self.pages
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(MatchPage::default()))
    }

    async fn record_swipe(&self, request: &SwipeRequest) -> Result<SwipeResponse, MatchFeedError> {
        self.swipe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_swipes {
            return Err(network_failed());
        }
        Ok(SwipeResponse {
            swipe: SwipeReceipt {
                id: Some("swipe_1".to_string()),
                swiped_id: request.swiped_id.clone(),
                swipe_type: request.swipe_type,
                created_at: None,
            },
            match_result: MatchCreation {
                match_created: true,
                match_details: Some(MatchDetails {
                    match_id: Some("match_1".to_string()),
                    conversation_id: Some("conv_1".to_string()),
                    matched_user_id: Some(request.swiped_id.clone()),
                }),
            },
        })
    }

    async fn confirm_match(
        &self,
        _request: &ConfirmMatchRequest,
    ) -> Result<ConfirmMatchResponse, MatchFeedError> {
        unimplemented!("confirm is exercised in the integration tests")
    }
}

fn feed_with(api: Arc<ScriptedApi>) -> MatchFeed {
    MatchFeed::new(api, Arc::new(TracingAnalytics), FeedConfig::default())
}

fn leo_filters(limit: u16) -> FetchFilters {
    FetchFilters {
        zodiac_sign: Some("Leo".to_string()),
        limit,
        ..FetchFilters::default()
    }
}

#[tokio::test]
async fn test_initial_load_populates_cache_without_duplicates() {
    // The backend repeats an id within the page; the cache keeps one copy.
    let api = ScriptedApi::new(vec![Ok(page(&["a", "b", "a", "c"], None))]);
    let feed = feed_with(api.clone());

    let batch = feed
        .load_initial_matches(FetchFilters::default())
        .await
        .unwrap();

    assert_eq!(batch.len(), 4);
    let stats = feed.cache_stats().await;
    assert_eq!(stats.cache_size, 3);
    assert!(stats.last_load_time.is_some());
}

#[tokio::test]
async fn test_initial_load_with_cursor_scenario() {
    let api = ScriptedApi::new(vec![Ok(page(&["a", "b", "c", "d", "e"], Some("abc")))]);
    let feed = feed_with(api.clone());

    let batch = feed.load_initial_matches(leo_filters(5)).await.unwrap();

    assert_eq!(batch.len(), 5);
    let stats = feed.cache_stats().await;
    assert_eq!(stats.cache_size, 5);
    assert!(stats.has_more);
    assert!(feed.has_more_matches().await);

    let queries = api.queries.lock().await;
    assert_eq!(queries[0].zodiac_sign.as_deref(), Some("Leo"));
    assert_eq!(queries[0].page_size, 5);
    assert!(queries[0].cursor.is_none());
}

#[tokio::test]
async fn test_initial_load_empty_backend() {
    let api = ScriptedApi::new(vec![Ok(page(&[], None))]);
    let feed = feed_with(api.clone());

    let batch = feed
        .load_initial_matches(FetchFilters::default())
        .await
        .unwrap();

    assert!(batch.is_empty());
    assert!(!feed.has_more_matches().await);
    assert_eq!(feed.cache_stats().await.cache_size, 0);
}

#[tokio::test]
async fn test_initial_load_discards_previous_session() {
    let api = ScriptedApi::new(vec![
        Ok(page(&["a", "b"], Some("tok"))),
        Ok(page(&["x"], None)),
    ]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    feed.record_swipe("a", SwipeKind::Like).await.unwrap();
    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();

    let stats = feed.cache_stats().await;
    assert_eq!(stats.cache_size, 1);
    // The viewed set belongs to the discarded session.
    assert_eq!(stats.viewed_count, 0);
    assert!(!feed.has_been_viewed("a").await);
}

#[tokio::test]
async fn test_get_next_without_cursor_skips_network() {
    let api = ScriptedApi::new(vec![Ok(page(&["a"], None))]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    assert_eq!(api.fetches(), 1);

    let batch = feed.get_next_matches(10).await.unwrap();
    assert!(batch.is_empty());
    assert_eq!(api.fetches(), 1);
}

#[tokio::test]
async fn test_get_next_without_filters_skips_network() {
    let api = ScriptedApi::new(vec![]);
    let feed = feed_with(api.clone());

    let batch = feed.get_next_matches(10).await.unwrap();
    assert!(batch.is_empty());
    assert_eq!(api.fetches(), 0);
}

#[tokio::test]
async fn test_get_next_merges_and_excludes_viewed() {
    let api = ScriptedApi::new(vec![
        Ok(page(&["a", "b"], Some("tok_1"))),
        // Overlapping id "b" must not be duplicated.
        Ok(page(&["b", "c"], Some("tok_2"))),
    ]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(leo_filters(2)).await.unwrap();
    feed.record_swipe("a", SwipeKind::Like).await.unwrap();

    let batch = feed.get_next_matches(2).await.unwrap();
    assert_eq!(batch.len(), 2);

    let stats = feed.cache_stats().await;
    assert_eq!(stats.cache_size, 3);
    assert!(stats.has_more);

    let queries = api.queries.lock().await;
    assert_eq!(queries[1].cursor.as_deref(), Some("tok_1"));
    assert_eq!(queries[1].exclude_user_ids, vec!["a".to_string()]);
    assert_eq!(queries[1].page_size, 2);
}

#[tokio::test]
async fn test_get_next_short_page_exhausts_cursor() {
    let api = ScriptedApi::new(vec![
        Ok(page(&["a", "b"], Some("tok_1"))),
        // Shorter than the requested 5, even though a cursor came back.
        Ok(page(&["c"], Some("tok_2"))),
    ]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    let batch = feed.get_next_matches(5).await.unwrap();

    assert_eq!(batch.len(), 1);
    assert!(!feed.has_more_matches().await);
}

#[tokio::test]
async fn test_reentrant_initial_load_is_rejected() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedApi::gated(vec![Ok(page(&["a"], None))], gate.clone());
    let feed = feed_with(api.clone());

    let first = {
        let feed = feed.clone();
        tokio::spawn(async move { feed.load_initial_matches(FetchFilters::default()).await })
    };
    // Let the first load reach the blocked fetch.
    tokio::task::yield_now().await;

    let err = feed
        .load_initial_matches(FetchFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MatchFeedError::Validation(_)));

    gate.notify_one();
    let batch = first.await.unwrap().unwrap();
    assert_eq!(batch.len(), 1);
}

#[tokio::test]
async fn test_concurrent_preloads_share_one_fetch() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedApi::gated(
        vec![
            Ok(page(&["a", "b"], Some("tok_1"))),
            Ok(page(&["c", "d", "e"], Some("tok_2"))),
        ],
        gate.clone(),
    );
    let feed = feed_with(api.clone());

    // Pre-arm the gate so the initial load passes straight through.
    gate.notify_one();
    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    assert_eq!(api.fetches(), 1);

    // Two preloads while the backend is still holding the response.
    let first = {
        let feed = feed.clone();
        tokio::spawn(async move { feed.preload_next_batch().await })
    };
    let second = {
        let feed = feed.clone();
        tokio::spawn(async move { feed.preload_next_batch().await })
    };
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(api.fetches(), 2);
    assert_eq!(feed.cache_stats().await.cache_size, 5);
}

#[tokio::test]
async fn test_preload_noop_without_cursor() {
    let api = ScriptedApi::new(vec![Ok(page(&["a"], None))]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    feed.preload_next_batch().await;

    assert_eq!(api.fetches(), 1);
}

#[tokio::test]
async fn test_swipe_marks_viewed_even_when_post_fails() {
    let api = ScriptedApi::failing_swipes(vec![Ok(page(&["a"], None))]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();

    let result = feed.record_swipe("a", SwipeKind::Pass).await;
    assert!(result.is_err());
    assert!(feed.has_been_viewed("a").await);
    assert_eq!(api.swipe_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_swipe_match_creation_passes_through() {
    let api = ScriptedApi::new(vec![Ok(page(&["a"], None))]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    let response = feed.record_swipe("a", SwipeKind::Like).await.unwrap();

    assert!(response.match_result.match_created);
    let details = response.match_result.match_details.unwrap();
    assert_eq!(details.conversation_id.as_deref(), Some("conv_1"));
    assert!(feed.has_been_viewed("a").await);
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_degrades_to_empty_batches() {
    let api = ScriptedApi::new(vec![
        Err(network_failed()),
        Err(network_failed()),
        Err(network_failed()),
    ]);
    let feed = feed_with(api.clone());

    for _ in 0..3 {
        let result = feed.load_initial_matches(FetchFilters::default()).await;
        assert!(result.is_err());
    }
    assert_eq!(feed.circuit_state().await.state, CircuitState::Open);

    // With the circuit open the feed serves the fallback, not an error,
    // and the backend is left alone.
    let batch = feed
        .load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    assert!(batch.is_empty());
    assert_eq!(api.fetches(), 3);
}

#[tokio::test]
async fn test_clear_cache_resets_everything() {
    let api = ScriptedApi::new(vec![Ok(page(&["a", "b"], Some("tok")))]);
    let feed = feed_with(api.clone());

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    feed.record_swipe("a", SwipeKind::Like).await.unwrap();
    feed.clear_cache().await;

    let stats = feed.cache_stats().await;
    assert_eq!(stats.cache_size, 0);
    assert_eq!(stats.viewed_count, 0);
    assert!(!stats.has_more);
    assert!(stats.last_load_time.is_none());

    // Without filters, pagination is inert.
    let batch = feed.get_next_matches(5).await.unwrap();
    assert!(batch.is_empty());
    assert_eq!(api.fetches(), 1);
}

#[tokio::test]
async fn test_cached_candidates_keep_insertion_order() {
    let api = ScriptedApi::new(vec![Ok(page(&["c", "a", "b"], None))]);
    let feed = feed_with(api);

    feed.load_initial_matches(FetchFilters::default())
        .await
        .unwrap();
    let cached = feed.cached_candidates().await;
    let ids: Vec<&str> = cached.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}
