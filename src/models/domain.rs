use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use crate::error::MatchFeedError;

/// A profile returned by the matching service, eligible for presentation.
///
/// Immutable once fetched; the feed only ever replaces or discards whole
/// profiles, never mutates them in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub zodiac_sign: Option<String>,
    #[serde(default)]
    pub compatibility_score: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub date_activity: Option<String>,
    #[serde(default)]
    pub is_match_recommended: Option<bool>,
}

impl CandidateProfile {
    /// Helper to get is_match_recommended as a bool, defaulting to false
    pub fn recommended(&self) -> bool {
        self.is_match_recommended.unwrap_or(false)
    }
}

/// Filter selections supplied by the UI for a candidate fetch.
///
/// Value object: a fresh copy is captured on each initial load and reused
/// verbatim for every follow-up page of that load.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FetchFilters {
    #[serde(default)]
    pub zodiac_sign: Option<String>,
    #[serde(default)]
    pub date_activity: Option<String>,
    #[validate(range(min = 18, max = 120))]
    #[serde(default)]
    pub min_age: Option<u8>,
    #[validate(range(min = 18, max = 120))]
    #[serde(default)]
    pub max_age: Option<u8>,
    #[serde(default)]
    pub max_distance: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u16,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u16>,
    #[serde(default)]
    pub refresh: bool,
}

fn default_limit() -> u16 {
    10
}

impl Default for FetchFilters {
    fn default() -> Self {
        Self {
            zodiac_sign: None,
            date_activity: None,
            min_age: None,
            max_age: None,
            max_distance: None,
            limit: default_limit(),
            cursor: None,
            page: None,
            page_size: None,
            refresh: false,
        }
    }
}

impl FetchFilters {
    /// Validate field ranges plus the min/max age ordering.
    pub fn check(&self) -> Result<(), MatchFeedError> {
        self.validate()
            .map_err(|e| MatchFeedError::Validation(e.to_string()))?;
        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            if min > max {
                return Err(MatchFeedError::Validation(format!(
                    "min_age {} exceeds max_age {}",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// A user decision on a presented candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeKind {
    Like,
    Pass,
}

impl SwipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeKind::Like => "like",
            SwipeKind::Pass => "pass",
        }
    }
}

impl FromStr for SwipeKind {
    type Err = MatchFeedError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "like" => Ok(SwipeKind::Like),
            "pass" => Ok(SwipeKind::Pass),
            other => Err(MatchFeedError::Validation(format!(
                "swipe type must be one of: like, pass (got \"{}\")",
                other
            ))),
        }
    }
}

/// Snapshot of the feed's bookkeeping, exposed to the UI for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub cache_size: usize,
    pub viewed_count: usize,
    pub has_more: bool,
    pub last_load_time: Option<DateTime<Utc>>,
}
