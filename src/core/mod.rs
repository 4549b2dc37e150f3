// Core state-machine exports
pub mod breaker;
pub mod cache;
pub mod recovery;
pub mod session;

pub use breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use cache::{FeedConfig, MatchFeed};
pub use recovery::{ErrorRecord, ErrorRecovery, ErrorState, LastOperation, ERROR_HISTORY_LIMIT};
pub use session::{MatchSession, SessionConfig, SessionEvent, SessionPhase};
