// Service exports
pub mod analytics;
pub mod api;
pub mod swipes;

pub use analytics::{AnalyticsEvent, AnalyticsSink, TracingAnalytics};
pub use api::{MatchApi, MatchApiClient};
pub use swipes::SwipeRecorder;
