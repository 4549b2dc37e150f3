mod config;
mod core;
mod error;
mod models;
mod services;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::core::{MatchFeed, MatchSession, SessionEvent};
use services::{MatchApiClient, TracingAnalytics};
use tracing::{error, info, warn};

/// Smoke probe: drives one presentation session against the configured
/// matching service and narrates what happens. Useful for verifying
/// endpoint, token, and breaker behavior outside the app.
#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Lume Feed probe...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded (endpoint: {})", settings.api.endpoint);
    if settings.api.auth_token.is_none() {
        warn!("No auth token configured (set LUME_API__AUTH_TOKEN); requests may be rejected");
    }

    // Wire the feed with injected dependencies
    let api = Arc::new(MatchApiClient::new(
        settings.api.endpoint.clone(),
        settings.api.auth_token.clone(),
        settings.fetch_timeout(),
    ));
    let feed = MatchFeed::new(api, Arc::new(TracingAnalytics), settings.feed_config());

    let filters = models::FetchFilters {
        limit: settings.api.default_page_size,
        ..models::FetchFilters::default()
    };
    let (session, mut events) = MatchSession::new(feed.clone(), filters, settings.session_config());

    let request_id = uuid::Uuid::new_v4().to_string();
    info!("Requesting potential matches (request {})", request_id);
    session.start_fetching_potential_matches(&request_id).await;

    // Narrate the first round of session events, then shut down.
    loop {
        let event = tokio::time::timeout(Duration::from_secs(20), events.recv()).await;
        match event {
            Ok(Some(SessionEvent::CandidatePresented(candidate))) => {
                info!(
                    "Presented candidate {} ({}, score: {:?})",
                    candidate.id,
                    candidate.display_name.as_deref().unwrap_or("unnamed"),
                    candidate.compatibility_score
                );
                let stats = feed.cache_stats().await;
                info!(
                    "Cache: {} candidates, more available: {}",
                    stats.cache_size, stats.has_more
                );
                break;
            }
            Ok(Some(SessionEvent::NoMatchesAvailable)) => {
                info!("No potential matches available right now");
                break;
            }
            Ok(Some(SessionEvent::SessionError { error, message })) => {
                error!("Session error: {} ({})", error, message);
                let breaker = session.circuit_breaker_state().await;
                info!(
                    "Circuit breaker: {:?} after {} failures",
                    breaker.state, breaker.failures
                );
                break;
            }
            Ok(Some(other)) => {
                info!("Session event: {:?}", other);
            }
            Ok(None) | Err(_) => {
                warn!("No session events received, giving up");
                break;
            }
        }
    }

    session.close().await;
    info!("Probe finished");
    Ok(())
}
