//! Driving port for profile registration and edits.

use async_trait::async_trait;

use crate::domain::{AnonymousId, Error, NewUserProfile, ProfileUpdate, UserId, UserProfile};

/// Driving port for profile writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccountCommand: Send + Sync {
    /// Register a profile. A taken username or anonymous id is rejected.
    async fn register(&self, profile: NewUserProfile) -> Result<UserProfile, Error>;

    /// Apply user-editable changes to the profile owning `anonymous_id`.
    async fn update_profile(
        &self,
        anonymous_id: &AnonymousId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, Error>;
}

/// Fixture command that accepts every registration without storing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserAccountCommand;

#[async_trait]
impl UserAccountCommand for FixtureUserAccountCommand {
    async fn register(&self, profile: NewUserProfile) -> Result<UserProfile, Error> {
        UserProfile::register(UserId::random(), profile)
            .map_err(|err| Error::invalid_request(err.to_string()))
    }

    async fn update_profile(
        &self,
        anonymous_id: &AnonymousId,
        _update: ProfileUpdate,
    ) -> Result<UserProfile, Error> {
        Err(Error::not_found(format!("profile {anonymous_id} not found")))
    }
}
