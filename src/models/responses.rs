use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{CandidateProfile, SwipeKind};

/// One page of candidates from the match-list endpoint.
///
/// An empty `data` array is a valid page, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPage {
    #[serde(default)]
    pub data: Vec<CandidateProfile>,
    #[serde(default)]
    pub pagination: PageInfo,
}

/// Pagination envelope; `nextCursor` is an opaque token, absent on the
/// last page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
}

/// Response to a recorded swipe, including any match the swipe created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub swipe: SwipeReceipt,
    #[serde(rename = "match")]
    pub match_result: MatchCreation,
}

/// Server acknowledgement of the stored swipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeReceipt {
    #[serde(default)]
    pub id: Option<String>,
    pub swiped_id: String,
    pub swipe_type: SwipeKind,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Whether the swipe produced a mutual match, passed through to the
/// caller unchanged for navigation handoff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchCreation {
    #[serde(default)]
    pub match_created: bool,
    #[serde(default)]
    pub match_details: Option<MatchDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDetails {
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub matched_user_id: Option<String>,
}

/// Response from the confirm-match endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmMatchResponse {
    pub success: bool,
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}
