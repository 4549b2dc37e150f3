use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::error::MatchFeedError;
use crate::models::{SwipeKind, SwipeRequest, SwipeResponse};
use crate::services::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::services::api::MatchApi;

/// Posts accept/decline decisions and interprets match-creation results.
///
/// Viewed-set bookkeeping happens in the feed *before* the recorder is
/// invoked, so a candidate counts as seen even when the post fails.
pub struct SwipeRecorder {
    api: Arc<dyn MatchApi>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl SwipeRecorder {
    pub fn new(api: Arc<dyn MatchApi>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { api, analytics }
    }

    /// Record a swipe and return the service's match-creation verdict
    /// unchanged, for navigation handoff.
    pub async fn record(
        &self,
        swiped_id: &str,
        kind: SwipeKind,
    ) -> Result<SwipeResponse, MatchFeedError> {
        let request = SwipeRequest {
            swiped_id: swiped_id.to_string(),
            swipe_type: kind,
        };
        request
            .validate()
            .map_err(|e| MatchFeedError::Validation(e.to_string()))?;

        let response = self.api.record_swipe(&request).await?;

        tracing::debug!(
            "recorded {} swipe on {} (match created: {})",
            kind.as_str(),
            swiped_id,
            response.match_result.match_created
        );

        // Analytics runs detached; a failing sink must never reach the caller.
        let sink = Arc::clone(&self.analytics);
        let event = AnalyticsEvent {
            name: "swipe_recorded",
            properties: json!({
                "swiped_id": swiped_id,
                "swipe_type": kind.as_str(),
                "match_created": response.match_result.match_created,
            }),
        };
        tokio::spawn(async move {
            if let Err(e) = sink.track(event).await {
                tracing::warn!("analytics tracking failed: {}", e);
            }
        });

        Ok(response)
    }
}
