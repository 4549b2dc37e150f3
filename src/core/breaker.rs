use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::MatchFeedError;

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before allowing a trial.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Current state of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Calls are rejected (or served from fallback) until the cooldown
    /// elapses.
    Open,
    /// A single trial call is in flight to probe recovery.
    HalfOpen,
}

/// Point-in-time view of the breaker, exposed to the UI for diagnostics.
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failures: u32,
    /// Time remaining until an open circuit admits a trial call.
    pub retry_after: Option<Duration>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

/// Failure-gating state machine in front of the match-list fetch path.
///
/// Transitions: Closed→Open after `failure_threshold` consecutive
/// failures, Open→HalfOpen once the cooldown elapses, HalfOpen→Closed on
/// a successful trial, HalfOpen→Open on a failed one. The breaker makes a
/// single attempt per call and never retries internally.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Arc<Mutex<BreakerInner>>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
            })),
        }
    }

    pub fn new_default() -> Self {
        Self::new(BreakerConfig::default())
    }

    /// Run `op` through the breaker, propagating its typed error.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, MatchFeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MatchFeedError>>,
    {
        self.admit().await?;
        self.run(op).await
    }

    /// Run `op` through the breaker; while the circuit is open, substitute
    /// `fallback()` instead of failing.
    pub async fn execute_with_fallback<T, F, Fut, FB>(
        &self,
        op: F,
        fallback: FB,
    ) -> Result<T, MatchFeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MatchFeedError>>,
        FB: FnOnce() -> T,
    {
        if self.admit().await.is_err() {
            tracing::debug!("circuit open, serving fallback result");
            return Ok(fallback());
        }
        self.run(op).await
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T, MatchFeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MatchFeedError>>,
    {
        match op().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(e) => {
                self.on_failure().await;
                Err(e)
            }
        }
    }

    /// Gate a call on the current state, transitioning Open→HalfOpen when
    /// the cooldown has elapsed.
    async fn admit(&self) -> Result<(), MatchFeedError> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);
                if elapsed {
                    tracing::info!("circuit cooldown elapsed, probing with a trial call");
                    inner.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(MatchFeedError::ServiceUnavailable)
                }
            }
        }
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != CircuitState::Closed {
            tracing::info!("circuit closed after successful call");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
    }

    async fn on_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());
        if inner.state == CircuitState::HalfOpen || inner.failures >= self.config.failure_threshold
        {
            if inner.state != CircuitState::Open {
                tracing::warn!(
                    "circuit opened after {} consecutive failures",
                    inner.failures
                );
            }
            inner.state = CircuitState::Open;
        }
    }

    pub async fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock().await;
        let retry_after = match inner.state {
            CircuitState::Open => inner
                .last_failure
                .map(|at| self.config.cooldown.saturating_sub(at.elapsed())),
            _ => None,
        };
        BreakerSnapshot {
            state: inner.state,
            failures: inner.failures,
            retry_after,
        }
    }

    /// Force the breaker back to closed, dropping failure history.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.last_failure = None;
    }
}
