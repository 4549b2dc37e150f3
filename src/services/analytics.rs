use async_trait::async_trait;
use serde_json::Value;

use crate::error::MatchFeedError;

/// A product-analytics event emitted after a user decision.
#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub properties: Value,
}

/// Destination for analytics events.
///
/// Callers must treat tracking as best-effort: a failing sink is logged
/// and dropped, never surfaced to the primary operation.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn track(&self, event: AnalyticsEvent) -> Result<(), MatchFeedError>;
}

/// Default sink that emits events into the tracing pipeline.
#[derive(Debug, Default, Clone)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    async fn track(&self, event: AnalyticsEvent) -> Result<(), MatchFeedError> {
        tracing::debug!(event = event.name, properties = %event.properties, "analytics event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let sink = TracingAnalytics;
        let result = sink
            .track(AnalyticsEvent {
                name: "swipe_recorded",
                properties: json!({"swipe_type": "like"}),
            })
            .await;

        assert!(result.is_ok());
    }
}
