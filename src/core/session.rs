use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::core::breaker::BreakerSnapshot;
use crate::core::cache::MatchFeed;
use crate::core::recovery::{ErrorRecovery, ErrorState, LastOperation};
use crate::error::{MatchFeedError, MatchingFailure};
use crate::models::{CandidateProfile, ConfirmMatchRequest, FetchFilters, SwipeKind};

/// Session-level pacing knobs, kept apart from the timer mechanism so
/// tests can drive them with a virtual clock.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between a decline and the next queued candidate.
    pub decline_delay: Duration,
    /// Queue length at which a background preload tops up the cache.
    pub preload_low_water: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            decline_delay: Duration::from_secs(180),
            preload_low_water: 3,
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Fetching,
    Presenting,
    Delaying,
    Exhausted,
}

impl SessionPhase {
    /// Pure transition for a completed initial fetch.
    pub fn after_fetch(batch_len: usize) -> SessionPhase {
        if batch_len == 0 {
            SessionPhase::Exhausted
        } else {
            SessionPhase::Presenting
        }
    }

    /// Pure transition for a decline, given what remains queued.
    pub fn after_decline(queue_len: usize) -> SessionPhase {
        if queue_len == 0 {
            SessionPhase::Exhausted
        } else {
            SessionPhase::Delaying
        }
    }
}

/// Whether an accept/decline is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecisionState {
    Idle,
    Accepting,
}

/// Notifications for the UI/navigation collaborator.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    CandidatePresented(CandidateProfile),
    NoMatchesAvailable,
    QueueExhausted,
    MatchConfirmed {
        match_id: Option<String>,
        conversation_id: Option<String>,
    },
    SessionError {
        error: MatchFeedError,
        message: &'static str,
    },
}

struct SessionState {
    phase: SessionPhase,
    active_request_id: Option<String>,
    queue: VecDeque<CandidateProfile>,
    current: Option<CandidateProfile>,
    decision: DecisionState,
    delay_task: Option<JoinHandle<()>>,
    /// Bumped whenever a delay timer is (re)scheduled; a firing timer
    /// with a stale generation does nothing.
    delay_generation: u64,
    /// Bumped on reset/recovery; awaited results from a previous epoch
    /// are discarded.
    epoch: u64,
    recovery: ErrorRecovery,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            active_request_id: None,
            queue: VecDeque::new(),
            current: None,
            decision: DecisionState::Idle,
            delay_task: None,
            delay_generation: 0,
            epoch: 0,
            recovery: ErrorRecovery::new(),
        }
    }

    fn abort_delay(&mut self) {
        if let Some(task) = self.delay_task.take() {
            task.abort();
        }
    }
}

struct SessionInner {
    feed: MatchFeed,
    filters: FetchFilters,
    config: SessionConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: Mutex<SessionState>,
}

/// Presents candidates one at a time and records the user's decisions.
///
/// One session per screen visit, constructed with its dependencies
/// injected; clones share the same state. Progress is reported over the
/// event channel returned by [`MatchSession::new`].
#[derive(Clone)]
pub struct MatchSession {
    inner: Arc<SessionInner>,
}

impl MatchSession {
    pub fn new(
        feed: MatchFeed,
        filters: FetchFilters,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            inner: Arc::new(SessionInner {
                feed,
                filters,
                config,
                events,
                state: Mutex::new(SessionState::new()),
            }),
        };
        (session, receiver)
    }

    /// Begin (or restart) fetching candidates for `request_id`.
    ///
    /// Idempotent: a call while a fetch is in progress, or with the
    /// already-active request id, is a no-op.
    pub async fn start_fetching_potential_matches(&self, request_id: &str) {
        let epoch = {
            let mut state = self.inner.state.lock().await;
            if state.phase == SessionPhase::Fetching {
                tracing::debug!("fetch already in progress, ignoring request {}", request_id);
                return;
            }
            if state.active_request_id.as_deref() == Some(request_id) {
                tracing::debug!("request {} already active, ignoring", request_id);
                return;
            }
            state.abort_delay();
            state.queue.clear();
            state.current = None;
            state.decision = DecisionState::Idle;
            state.phase = SessionPhase::Fetching;
            state.active_request_id = Some(request_id.to_string());
            state.epoch += 1;
            state.recovery.note_operation(LastOperation::Fetch {
                request_id: request_id.to_string(),
            });
            state.epoch
        };

        tracing::info!("starting potential-match fetch for request {}", request_id);
        let result = self
            .inner
            .feed
            .load_initial_matches(self.inner.filters.clone())
            .await;

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!("stale fetch result discarded for request {}", request_id);
            return;
        }
        match result {
            Ok(batch) => {
                state.phase = SessionPhase::after_fetch(batch.len());
                if batch.is_empty() {
                    state.active_request_id = None;
                    tracing::info!("no potential matches available for request {}", request_id);
                    self.emit(SessionEvent::NoMatchesAvailable);
                    return;
                }
                let mut batch = batch.into_iter();
                state.current = batch.next();
                state.queue = batch.collect();
                if let Some(candidate) = &state.current {
                    self.emit(SessionEvent::CandidatePresented(candidate.clone()));
                }
                // Keep the cache warm for upcoming presentations.
                self.spawn_preload();
            }
            Err(error) => {
                state.phase = SessionPhase::Exhausted;
                state.active_request_id = None;
                let message = error.user_message();
                tracing::error!("initial match fetch failed: {}", error);
                state.recovery.record(error.clone());
                self.emit(SessionEvent::SessionError { error, message });
            }
        }
    }

    /// Confirm the currently presented candidate as a match.
    ///
    /// On success the session is cleared and `MatchConfirmed` carries the
    /// conversation id for navigation. On failure the queue is left
    /// untouched so a retry can replay safely.
    pub async fn accept_current_potential_match(&self) {
        let (epoch, target_id, request_id) = {
            let mut state = self.inner.state.lock().await;
            let current = match &state.current {
                Some(c) => c.clone(),
                None => {
                    tracing::debug!("accept ignored, no candidate presented");
                    return;
                }
            };
            if state.decision != DecisionState::Idle {
                tracing::debug!("accept ignored, a decision is already in flight");
                return;
            }
            state.decision = DecisionState::Accepting;
            state.recovery.note_operation(LastOperation::Accept);
            let request_id = state.active_request_id.clone().unwrap_or_default();
            (state.epoch, current.id, request_id)
        };

        let request = ConfirmMatchRequest {
            target_user_id: target_id,
            request_id,
        };
        let result = self.inner.feed.api().confirm_match(&request).await;

        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!("stale confirmation result discarded");
            return;
        }
        state.decision = DecisionState::Idle;
        match result {
            Ok(response) if response.success => {
                state.abort_delay();
                state.current = None;
                state.queue.clear();
                state.phase = SessionPhase::Idle;
                state.active_request_id = None;
                tracing::info!(
                    "match confirmed: match_id={:?} conversation_id={:?}",
                    response.match_id,
                    response.conversation_id
                );
                self.emit(SessionEvent::MatchConfirmed {
                    match_id: response.match_id,
                    conversation_id: response.conversation_id,
                });
            }
            Ok(_) => {
                let error = MatchFeedError::Matching {
                    kind: MatchingFailure::ConfirmationFailed,
                    message: "the service declined to confirm the match".to_string(),
                };
                let message = error.user_message();
                tracing::warn!("match confirmation rejected by the service");
                state.recovery.record(error.clone());
                self.emit(SessionEvent::SessionError { error, message });
            }
            Err(error) => {
                let message = error.user_message();
                tracing::warn!("match confirmation failed: {}", error);
                state.recovery.record(error.clone());
                self.emit(SessionEvent::SessionError { error, message });
            }
        }
    }

    /// Dismiss the currently presented candidate.
    ///
    /// The "not interested" swipe is recorded best-effort in the
    /// background. With candidates still queued, the next one appears
    /// after the configured decline delay; declining again while that
    /// timer is pending restarts it (replace, never stack).
    pub async fn decline_current_potential_match(&self) {
        let mut state = self.inner.state.lock().await;
        if state.decision != DecisionState::Idle {
            tracing::debug!("decline ignored, a decision is already in flight");
            return;
        }
        match state.current.take() {
            Some(current) => {
                state.recovery.note_operation(LastOperation::Decline);
                let feed = self.inner.feed.clone();
                let id = current.id.clone();
                tokio::spawn(async move {
                    if let Err(e) = feed.record_swipe(&id, SwipeKind::Pass).await {
                        tracing::warn!("failed to record pass swipe for {}: {}", id, e);
                    }
                });

                state.phase = SessionPhase::after_decline(state.queue.len());
                if state.phase == SessionPhase::Exhausted {
                    state.active_request_id = None;
                    tracing::info!("presentation queue exhausted");
                    self.emit(SessionEvent::QueueExhausted);
                } else {
                    self.schedule_delayed_present(&mut state);
                }
            }
            None if state.phase == SessionPhase::Delaying => {
                // Another dismissal while the pacing timer runs restarts
                // the window.
                state.recovery.note_operation(LastOperation::Decline);
                self.schedule_delayed_present(&mut state);
            }
            None => {
                tracing::debug!("decline ignored, no candidate presented");
            }
        }
    }

    /// Top up the cache in the background; the feed coalesces
    /// overlapping preloads into a single fetch.
    fn spawn_preload(&self) {
        let feed = self.inner.feed.clone();
        tokio::spawn(async move {
            feed.preload_next_batch().await;
        });
    }

    /// Replace any pending re-presentation timer with a fresh one.
    fn schedule_delayed_present(&self, state: &mut SessionState) {
        state.abort_delay();
        state.delay_generation += 1;
        let generation = state.delay_generation;
        let delay = self.inner.config.decline_delay;
        let session = self.clone();
        tracing::debug!(
            "next candidate paced for presentation in {:?} (generation {})",
            delay,
            generation
        );
        state.delay_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.present_after_delay(generation).await;
        }));
    }

    async fn present_after_delay(&self, generation: u64) {
        let mut state = self.inner.state.lock().await;
        if state.delay_generation != generation || state.phase != SessionPhase::Delaying {
            tracing::debug!("stale pacing timer fired, ignoring");
            return;
        }
        state.delay_task = None;
        match state.queue.pop_front() {
            Some(next) => {
                state.current = Some(next.clone());
                state.phase = SessionPhase::Presenting;
                self.emit(SessionEvent::CandidatePresented(next));
                if state.queue.len() < self.inner.config.preload_low_water {
                    self.spawn_preload();
                }
            }
            None => {
                state.phase = SessionPhase::Exhausted;
                state.active_request_id = None;
                self.emit(SessionEvent::QueueExhausted);
            }
        }
    }

    /// Replay the most recent operation after a failure.
    ///
    /// Never automatic: only the UI calls this, in response to the user.
    pub async fn retry_last_operation(&self) {
        let operation = {
            let mut state = self.inner.state.lock().await;
            state.recovery.take_retry()
        };
        match operation {
            Some(LastOperation::Fetch { request_id }) => {
                tracing::info!("retrying match fetch for request {}", request_id);
                self.start_fetching_potential_matches(&request_id).await;
            }
            Some(LastOperation::Accept) => {
                tracing::info!("retrying match confirmation");
                self.accept_current_potential_match().await;
            }
            Some(LastOperation::Decline) => {
                tracing::info!("retrying decline");
                self.decline_current_potential_match().await;
            }
            None => {
                tracing::warn!("retry requested but no operation was recorded");
            }
        }
    }

    /// Drop the current error without touching session state.
    pub async fn clear_error(&self) {
        let mut state = self.inner.state.lock().await;
        state.recovery.clear_current();
    }

    /// Full local reset: pending timers, queue, current candidate, cache
    /// and cursor are all dropped without any network traffic, then the
    /// error state is cleared.
    pub async fn recover_from_error(&self) {
        {
            let mut state = self.inner.state.lock().await;
            state.recovery.begin_recovery();
            state.epoch += 1;
            state.abort_delay();
            state.queue.clear();
            state.current = None;
            state.decision = DecisionState::Idle;
            state.phase = SessionPhase::Idle;
            state.active_request_id = None;
        }
        self.inner.feed.clear_cache().await;
        let mut state = self.inner.state.lock().await;
        state.recovery.finish_recovery();
        tracing::info!("session recovered to a clean state");
    }

    /// Explicit teardown when the screen goes away.
    pub async fn close(&self) {
        {
            let mut state = self.inner.state.lock().await;
            state.epoch += 1;
            state.abort_delay();
            state.queue.clear();
            state.current = None;
            state.decision = DecisionState::Idle;
            state.phase = SessionPhase::Idle;
            state.active_request_id = None;
        }
        self.inner.feed.cleanup().await;
        tracing::debug!("session closed");
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.state.lock().await.phase
    }

    pub async fn current_candidate(&self) -> Option<CandidateProfile> {
        self.inner.state.lock().await.current.clone()
    }

    pub async fn queue_len(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }

    pub async fn active_request_id(&self) -> Option<String> {
        self.inner.state.lock().await.active_request_id.clone()
    }

    pub async fn error_state(&self) -> ErrorState {
        self.inner.state.lock().await.recovery.snapshot()
    }

    pub async fn circuit_breaker_state(&self) -> BreakerSnapshot {
        self.inner.feed.circuit_state().await
    }

    fn emit(&self, event: SessionEvent) {
        if self.inner.events.send(event).is_err() {
            tracing::debug!("session event receiver dropped");
        }
    }
}
