//! Driving port for profile lookups.

use async_trait::async_trait;

use crate::domain::{AnonymousId, Error, UserProfile, Username};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccountQuery: Send + Sync {
    /// Look a profile up by username; unknown usernames are `not_found`.
    async fn login(&self, username: &Username) -> Result<UserProfile, Error>;

    /// Fetch the profile owning `anonymous_id`.
    async fn get_profile(&self, anonymous_id: &AnonymousId) -> Result<UserProfile, Error>;
}

/// Fixture query that knows no profiles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserAccountQuery;

#[async_trait]
impl UserAccountQuery for FixtureUserAccountQuery {
    async fn login(&self, username: &Username) -> Result<UserProfile, Error> {
        Err(Error::not_found(format!("user {username} not found")))
    }

    async fn get_profile(&self, anonymous_id: &AnonymousId) -> Result<UserProfile, Error> {
        Err(Error::not_found(format!("profile {anonymous_id} not found")))
    }
}
