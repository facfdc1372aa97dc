//! Outbound gateway the client uses to reach the engagement API.
//!
//! [`EngagementGateway`] is the client-side port; [`HttpEngagementGateway`]
//! speaks the `/api/v1` JSON contract over reqwest and owns transport details
//! only: timeouts, status mapping, and body decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::LeaderboardTimeframe;
use crate::domain::ports::define_port_error;
use crate::inbound::http::sugar_events::{
    LogSugarEventBody, LogSugarEventResponseBody, SugarEventBody,
};
use crate::inbound::http::users::LeaderboardEntryBody;

define_port_error! {
    /// Failures raised while talking to the engagement API.
    pub enum GatewayError {
        /// The request never produced a response.
        Transport { message: String } => "engagement API transport failed: {message}",
        /// The request exceeded the client timeout.
        Timeout { message: String } => "engagement API timed out: {message}",
        /// The API answered with a non-success status.
        Status { status: u16, message: String } =>
            "engagement API returned {status}: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "engagement API payload invalid: {message}",
        /// The base URL could not be extended with the endpoint path.
        InvalidUrl { message: String } => "engagement API url invalid: {message}",
    }
}

/// Client-side port for the engagement API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementGateway: Send + Sync {
    /// Submit an event and receive the authoritative outcome.
    async fn log_event(
        &self,
        body: LogSugarEventBody,
    ) -> Result<LogSugarEventResponseBody, GatewayError>;

    /// Fetch a user's history, newest first.
    async fn list_events(&self, user_id: String) -> Result<Vec<SugarEventBody>, GatewayError>;

    /// Fetch leaderboard standings.
    async fn leaderboard(
        &self,
        timeframe: LeaderboardTimeframe,
    ) -> Result<Vec<LeaderboardEntryBody>, GatewayError>;
}

/// Reqwest-backed gateway rooted at one API base URL.
pub struct HttpEngagementGateway {
    client: Client,
    base: Url,
}

impl HttpEngagementGateway {
    /// Build a gateway whose requests time out after `timeout`.
    ///
    /// `base` should point at the API root, for example
    /// `http://localhost:8080/api/v1/`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        join_endpoint(&self.base, path)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref())
            .map_err(|error| GatewayError::decode(error.to_string()))
    }
}

#[async_trait]
impl EngagementGateway for HttpEngagementGateway {
    async fn log_event(
        &self,
        body: LogSugarEventBody,
    ) -> Result<LogSugarEventResponseBody, GatewayError> {
        let response = self
            .client
            .post(self.endpoint("sugar-events")?)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::decode(response).await
    }

    async fn list_events(&self, user_id: String) -> Result<Vec<SugarEventBody>, GatewayError> {
        let response = self
            .client
            .get(self.endpoint(&format!("sugar-events/{user_id}"))?)
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::decode(response).await
    }

    async fn leaderboard(
        &self,
        timeframe: LeaderboardTimeframe,
    ) -> Result<Vec<LeaderboardEntryBody>, GatewayError> {
        let response = self
            .client
            .get(self.endpoint("users/leaderboard")?)
            .query(&[("timeframe", timeframe.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::decode(response).await
    }
}

fn join_endpoint(base: &Url, path: &str) -> Result<Url, GatewayError> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let with_slash = format!("{}/", root.path());
        root.set_path(&with_slash);
    }
    root.join(path)
        .map_err(|error| GatewayError::invalid_url(error.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::timeout(error.to_string())
    } else {
        GatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    // Prefer the API's own error message when the body is the error payload.
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body_preview(body));
    GatewayError::status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
