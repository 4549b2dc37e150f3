use thiserror::Error;

/// How a network round trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    Offline,
    Timeout,
    Failed,
    RateLimited,
}

/// How authentication with the matching service failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    TokenExpired,
    TokenInvalid,
    SessionExpired,
    PermissionDenied,
}

/// How a match operation failed beyond transport concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingFailure {
    RequestFailed,
    NoEligibleUsers,
    AlreadyExists,
    ConfirmationFailed,
}

/// Typed error taxonomy for the feed.
///
/// Classification happens exactly once, at the gateway/swipe-recorder
/// boundary; everything downstream matches on these variants. `Clone` so
/// errors can live in the bounded error history while still being
/// returned to the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchFeedError {
    #[error("network error ({kind:?}): {message}")]
    Network {
        kind: NetworkFailure,
        message: String,
    },

    #[error("authentication error ({kind:?})")]
    Authentication { kind: AuthFailure },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("matching error ({kind:?}): {message}")]
    Matching {
        kind: MatchingFailure,
        message: String,
    },

    #[error("matching service unavailable (circuit open)")]
    ServiceUnavailable,

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl MatchFeedError {
    /// Classify a transport-level failure from the HTTP client.
    pub fn from_transport(err: &reqwest::Error, context: &str) -> Self {
        if err.is_timeout() {
            MatchFeedError::Network {
                kind: NetworkFailure::Timeout,
                message: format!("{}: request deadline elapsed", context),
            }
        } else if err.is_connect() {
            MatchFeedError::Network {
                kind: NetworkFailure::Offline,
                message: format!("{}: connection failed", context),
            }
        } else {
            MatchFeedError::Network {
                kind: NetworkFailure::Failed,
                message: format!("{}: {}", context, err),
            }
        }
    }

    /// Classify a non-2xx HTTP status.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => MatchFeedError::Authentication {
                kind: AuthFailure::TokenExpired,
            },
            403 => MatchFeedError::Authentication {
                kind: AuthFailure::PermissionDenied,
            },
            429 => MatchFeedError::Network {
                kind: NetworkFailure::RateLimited,
                message: format!("{}: rate limited", context),
            },
            code => MatchFeedError::Network {
                kind: NetworkFailure::Failed,
                message: format!("{}: server returned status {}", context, code),
            },
        }
    }

    /// Classify a response body that could not be parsed.
    pub fn invalid_response(context: &str, detail: impl std::fmt::Display) -> Self {
        MatchFeedError::Unknown(format!("{}: invalid response format: {}", context, detail))
    }

    /// Whether retrying the failed operation can plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MatchFeedError::Network { .. } | MatchFeedError::ServiceUnavailable => true,
            MatchFeedError::Matching { kind, .. } => matches!(
                kind,
                MatchingFailure::RequestFailed | MatchingFailure::ConfirmationFailed
            ),
            MatchFeedError::Authentication { .. }
            | MatchFeedError::Validation(_)
            | MatchFeedError::Unknown(_) => false,
        }
    }

    /// User-facing message for the UI collaborator.
    pub fn user_message(&self) -> &'static str {
        match self {
            MatchFeedError::Network {
                kind: NetworkFailure::Offline,
                ..
            } => "You appear to be offline. Check your connection and try again.",
            MatchFeedError::Network {
                kind: NetworkFailure::Timeout,
                ..
            } => "The matching service is taking too long to respond. Try again in a moment.",
            MatchFeedError::Network {
                kind: NetworkFailure::RateLimited,
                ..
            } => "You're going a little fast. Give it a moment and try again.",
            MatchFeedError::Network { .. } => {
                "Something went wrong while talking to the matching service."
            }
            MatchFeedError::Authentication { .. } => "Your session has expired. Please sign in again.",
            MatchFeedError::Validation(_) => "That request doesn't look right. Please try again.",
            MatchFeedError::Matching {
                kind: MatchingFailure::NoEligibleUsers,
                ..
            } => "No new matches right now. Check back later!",
            MatchFeedError::Matching {
                kind: MatchingFailure::AlreadyExists,
                ..
            } => "Looks like you two already matched.",
            MatchFeedError::Matching { .. } => "We couldn't complete that match action. Try again.",
            MatchFeedError::ServiceUnavailable => {
                "Matching is temporarily unavailable. We'll keep trying."
            }
            MatchFeedError::Unknown(_) => "Something unexpected went wrong. Try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let unauthorized =
            MatchFeedError::from_status(reqwest::StatusCode::UNAUTHORIZED, "fetch");
        assert_eq!(
            unauthorized,
            MatchFeedError::Authentication {
                kind: AuthFailure::TokenExpired
            }
        );

        let forbidden = MatchFeedError::from_status(reqwest::StatusCode::FORBIDDEN, "fetch");
        assert_eq!(
            forbidden,
            MatchFeedError::Authentication {
                kind: AuthFailure::PermissionDenied
            }
        );

        let server_error =
            MatchFeedError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "fetch");
        assert!(matches!(
            server_error,
            MatchFeedError::Network {
                kind: NetworkFailure::Failed,
                ..
            }
        ));

        let throttled =
            MatchFeedError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "fetch");
        assert!(matches!(
            throttled,
            MatchFeedError::Network {
                kind: NetworkFailure::RateLimited,
                ..
            }
        ));
    }

    #[test]
    fn test_recoverability() {
        assert!(MatchFeedError::ServiceUnavailable.is_recoverable());
        assert!(MatchFeedError::Network {
            kind: NetworkFailure::Timeout,
            message: String::new()
        }
        .is_recoverable());
        assert!(!MatchFeedError::Validation("bad".into()).is_recoverable());
        assert!(!MatchFeedError::Authentication {
            kind: AuthFailure::SessionExpired
        }
        .is_recoverable());
        assert!(!MatchFeedError::Matching {
            kind: MatchingFailure::AlreadyExists,
            message: String::new()
        }
        .is_recoverable());
    }

    #[test]
    fn test_every_variant_has_a_user_message() {
        let errors = [
            MatchFeedError::Network {
                kind: NetworkFailure::Offline,
                message: String::new(),
            },
            MatchFeedError::Authentication {
                kind: AuthFailure::TokenInvalid,
            },
            MatchFeedError::Validation("x".into()),
            MatchFeedError::Matching {
                kind: MatchingFailure::ConfirmationFailed,
                message: String::new(),
            },
            MatchFeedError::ServiceUnavailable,
            MatchFeedError::Unknown("x".into()),
        ];

        for error in errors {
            assert!(!error.user_message().is_empty());
        }
    }
}
