//! Deadline and error mapping for calls into the event store.
//!
//! Every store call made by a service goes through [`StoreDeadline::run`], so
//! a hung store surfaces as `service_unavailable` instead of blocking the
//! request. Failed calls are reported, never retried.

use std::future::Future;
use std::time::Duration;

use serde_json::json;
use tracing::{error, warn};

use super::Error;
use super::ports::{SugarEventRepositoryError, UserProfileRepositoryError};

/// Default per-call store deadline.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Conversion of a repository error into the domain error.
pub trait StoreFailure {
    fn into_domain_error(self) -> Error;
}

impl StoreFailure for SugarEventRepositoryError {
    fn into_domain_error(self) -> Error {
        match self {
            Self::Connection { message } | Self::Timeout { message } => {
                warn!(%message, "sugar event store unavailable");
                Error::service_unavailable(format!("sugar event store unavailable: {message}"))
            }
            Self::Query { message } => {
                error!(%message, "sugar event store query failed");
                Error::internal(format!("sugar event store error: {message}"))
            }
        }
    }
}

impl StoreFailure for UserProfileRepositoryError {
    fn into_domain_error(self) -> Error {
        match self {
            Self::Connection { message } | Self::Timeout { message } => {
                warn!(%message, "user profile store unavailable");
                Error::service_unavailable(format!("user profile store unavailable: {message}"))
            }
            Self::Query { message } => {
                error!(%message, "user profile store query failed");
                Error::internal(format!("user profile store error: {message}"))
            }
            Self::DuplicateUsername { username } => {
                Error::invalid_request(format!("username {username} is already taken"))
                    .with_details(json!({ "field": "username", "code": "username_taken" }))
            }
            Self::DuplicateAnonymousId { anonymous_id } => Error::invalid_request(format!(
                "anonymous id {anonymous_id} is already registered"
            ))
            .with_details(json!({ "field": "anonymousId", "code": "anonymous_id_taken" })),
        }
    }
}

/// Deadline applied to each individual store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDeadline {
    timeout: Duration,
}

impl Default for StoreDeadline {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_TIMEOUT)
    }
}

impl StoreDeadline {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Await `call`, mapping failures and deadline overruns to [`Error`].
    pub async fn run<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, E>>,
        E: StoreFailure,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(StoreFailure::into_domain_error),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(Error::service_unavailable(format!(
                    "{operation} timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}
