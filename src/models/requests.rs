use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{FetchFilters, SwipeKind};

/// Wire payload for the match-list endpoint.
///
/// Field names follow the server contract, which mixes snake_case filter
/// fields with camelCase pagination fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchQueryRequest {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zodiac_sign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_km: Option<u32>,
    #[serde(default)]
    pub refresh: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_user_ids: Vec<String>,
}

impl MatchQueryRequest {
    /// Map client-side filters onto the server's field names.
    ///
    /// `limit` doubles as the page size; `cursor` overrides any cursor
    /// carried inside the filters (the pagination state owns it).
    pub fn from_filters(
        filters: &FetchFilters,
        limit: u16,
        cursor: Option<String>,
        exclude_user_ids: Vec<String>,
    ) -> Self {
        Self {
            page: filters.page.unwrap_or(1),
            page_size: limit,
            cursor: cursor.or_else(|| filters.cursor.clone()),
            zodiac_sign: filters.zodiac_sign.clone(),
            activity_type: filters.date_activity.clone(),
            min_age: filters.min_age,
            max_age: filters.max_age,
            max_distance_km: filters.max_distance,
            refresh: filters.refresh,
            exclude_user_ids,
        }
    }
}

/// Wire payload for recording a swipe decision.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    pub swiped_id: String,
    pub swipe_type: SwipeKind,
}

/// Wire payload for confirming a mutual match.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmMatchRequest {
    #[validate(length(min = 1))]
    pub target_user_id: String,
    #[validate(length(min = 1))]
    pub request_id: String,
}
