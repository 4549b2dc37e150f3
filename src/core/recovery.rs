use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::error::MatchFeedError;

/// How many past errors the history retains.
pub const ERROR_HISTORY_LIMIT: usize = 5;

/// The most recent user-visible operation, replayed by retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastOperation {
    Fetch { request_id: String },
    Accept,
    Decline,
}

/// One recorded failure.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub error: MatchFeedError,
    pub occurred_at: DateTime<Utc>,
}

/// Snapshot of the recovery bookkeeping, exposed to the UI.
#[derive(Debug, Clone)]
pub struct ErrorState {
    pub has_error: bool,
    pub error: Option<MatchFeedError>,
    pub user_message: Option<&'static str>,
    pub history: Vec<ErrorRecord>,
    pub retry_count: u32,
    pub recovery_attempts: u32,
    pub is_recovering: bool,
}

/// Error bookkeeping for a session: current error, bounded history, and
/// the last-operation record consumed by retry.
///
/// Pure state, no timers or I/O, so transitions are testable directly.
#[derive(Debug, Default)]
pub struct ErrorRecovery {
    current: Option<MatchFeedError>,
    history: VecDeque<ErrorRecord>,
    retry_count: u32,
    recovery_attempts: u32,
    is_recovering: bool,
    last_operation: Option<LastOperation>,
}

impl ErrorRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a classified error as current and append it to the bounded
    /// history.
    pub fn record(&mut self, error: MatchFeedError) {
        self.history.push_back(ErrorRecord {
            error: error.clone(),
            occurred_at: Utc::now(),
        });
        while self.history.len() > ERROR_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.current = Some(error);
    }

    /// Remember the operation a later retry should replay.
    pub fn note_operation(&mut self, operation: LastOperation) {
        self.last_operation = Some(operation);
    }

    /// Consume the retry intent: clears the current error, bumps the
    /// retry counter, and hands back the operation to replay.
    ///
    /// Returns `None` (and counts nothing) when no operation was
    /// recorded.
    pub fn take_retry(&mut self) -> Option<LastOperation> {
        let operation = self.last_operation.clone()?;
        self.retry_count += 1;
        self.current = None;
        Some(operation)
    }

    /// Drop the current error; history stays intact.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn begin_recovery(&mut self) {
        self.is_recovering = true;
        self.recovery_attempts += 1;
    }

    pub fn finish_recovery(&mut self) {
        self.is_recovering = false;
        self.current = None;
    }

    pub fn snapshot(&self) -> ErrorState {
        ErrorState {
            has_error: self.current.is_some(),
            error: self.current.clone(),
            user_message: self.current.as_ref().map(|e| e.user_message()),
            history: self.history.iter().cloned().collect(),
            retry_count: self.retry_count,
            recovery_attempts: self.recovery_attempts,
            is_recovering: self.is_recovering,
        }
    }
}
