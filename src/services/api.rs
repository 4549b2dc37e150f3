use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{MatchFeedError, MatchingFailure};
use crate::models::{
    ConfirmMatchRequest, ConfirmMatchResponse, MatchPage, MatchQueryRequest, SwipeRequest,
    SwipeResponse,
};

const MATCH_QUERY_PATH: &str = "/v1/matches/query";
const SWIPE_PATH: &str = "/v1/swipes";
const CONFIRM_MATCH_PATH: &str = "/v1/matches/confirm";

/// The remote matching service, seen from the client.
///
/// Implementations classify every failure into the typed taxonomy before
/// returning; nothing downstream sees raw transport errors.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Fetch one page of candidates.
    async fn fetch_candidates(
        &self,
        query: &MatchQueryRequest,
    ) -> Result<MatchPage, MatchFeedError>;

    /// Record an accept/decline decision.
    async fn record_swipe(&self, request: &SwipeRequest) -> Result<SwipeResponse, MatchFeedError>;

    /// Confirm a mutual match and obtain the conversation handle.
    async fn confirm_match(
        &self,
        request: &ConfirmMatchRequest,
    ) -> Result<ConfirmMatchResponse, MatchFeedError>;
}

/// HTTP client for the matching service.
///
/// Owns the request timeout and the status-to-error mapping; this is the
/// single place where transport failures become typed errors.
pub struct MatchApiClient {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
    fetch_timeout: Duration,
}

impl MatchApiClient {
    /// Create a new client
    pub fn new(base_url: String, auth_token: Option<String>, fetch_timeout: Duration) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            auth_token,
            client,
            fetch_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body, racing it against the fetch timeout.
    ///
    /// Returns the status and raw body so each endpoint can apply its own
    /// status classification before parsing.
    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<(StatusCode, String), MatchFeedError> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let mut request = self
            .client
            .post(&url)
            .timeout(self.fetch_timeout)
            .json(body);

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MatchFeedError::from_transport(&e, context))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MatchFeedError::from_transport(&e, context))?;

        Ok((status, text))
    }

    fn parse<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, MatchFeedError> {
        serde_json::from_str(body).map_err(|e| MatchFeedError::invalid_response(context, e))
    }
}

#[async_trait]
impl MatchApi for MatchApiClient {
    async fn fetch_candidates(
        &self,
        query: &MatchQueryRequest,
    ) -> Result<MatchPage, MatchFeedError> {
        let context = "fetch candidates";
        let (status, body) = self.post(MATCH_QUERY_PATH, query, context).await?;

        if !status.is_success() {
            tracing::warn!("candidate fetch failed: {} - {}", status, body);
            return Err(MatchFeedError::from_status(status, context));
        }

        let page: MatchPage = Self::parse(&body, context)?;
        tracing::debug!(
            "fetched {} candidates (next cursor: {:?})",
            page.data.len(),
            page.pagination.next_cursor
        );
        Ok(page)
    }

    async fn record_swipe(&self, request: &SwipeRequest) -> Result<SwipeResponse, MatchFeedError> {
        let context = "record swipe";
        let (status, body) = self.post(SWIPE_PATH, request, context).await?;

        if status == StatusCode::BAD_REQUEST {
            return Err(MatchFeedError::Validation(format!(
                "swipe rejected by the service: {}",
                body
            )));
        }
        if !status.is_success() {
            tracing::warn!("swipe recording failed: {} - {}", status, body);
            return Err(MatchFeedError::from_status(status, context));
        }

        Self::parse(&body, context)
    }

    async fn confirm_match(
        &self,
        request: &ConfirmMatchRequest,
    ) -> Result<ConfirmMatchResponse, MatchFeedError> {
        let context = "confirm match";
        let (status, body) = self.post(CONFIRM_MATCH_PATH, request, context).await?;

        match status.as_u16() {
            409 => {
                return Err(MatchFeedError::Matching {
                    kind: MatchingFailure::AlreadyExists,
                    message: format!("match already exists for {}", request.target_user_id),
                })
            }
            404 => {
                return Err(MatchFeedError::Matching {
                    kind: MatchingFailure::ConfirmationFailed,
                    message: format!("no pending match for {}", request.target_user_id),
                })
            }
            _ => {}
        }
        if !status.is_success() {
            tracing::warn!("match confirmation failed: {} - {}", status, body);
            return Err(MatchFeedError::from_status(status, context));
        }

        Self::parse(&body, context)
    }
}
