//! Lume Feed - potential-match acquisition and resilience layer for the Lume dating app
//!
//! This library acquires, caches, and paginates potential-match candidates
//! for the client UI, records accept/decline decisions back to the
//! matching service, and keeps the experience responsive through a
//! circuit-breaker-gated fetch path with explicit error recovery.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    BreakerConfig, BreakerSnapshot, CircuitBreaker, CircuitState, ErrorRecord, ErrorState,
    FeedConfig, LastOperation, MatchFeed, MatchSession, SessionConfig, SessionEvent, SessionPhase,
};
pub use error::{AuthFailure, MatchFeedError, MatchingFailure, NetworkFailure};
pub use models::{CacheStats, CandidateProfile, FetchFilters, SwipeKind};
pub use services::{AnalyticsEvent, AnalyticsSink, MatchApi, MatchApiClient, TracingAnalytics};
