//! Port abstraction for profile persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{AnonymousId, StreakState, UserId, UserProfile, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by profile repository adapters.
    pub enum UserProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user profile repository query failed: {message}",
        /// The store did not answer within the configured deadline.
        Timeout { message: String } => "user profile repository timed out: {message}",
        /// Another profile already owns the username.
        DuplicateUsername { username: String } => "username {username} is already taken",
        /// Another profile already owns the anonymous id.
        DuplicateAnonymousId { anonymous_id: String } =>
            "anonymous id {anonymous_id} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Insert a freshly registered profile.
    async fn create(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError>;

    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError>;

    async fn find_by_anonymous_id(
        &self,
        anonymous_id: &AnonymousId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError>;

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError>;

    /// Profiles for the given ids; unknown ids are skipped.
    async fn find_many(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserProfile>, UserProfileRepositoryError>;

    /// Persist user-editable attributes. Points and streak are left alone.
    async fn update_attributes(
        &self,
        profile: &UserProfile,
    ) -> Result<(), UserProfileRepositoryError>;

    /// Atomically add `points_delta` and install `streak`.
    ///
    /// Returns the updated profile, or `None` when the user does not exist.
    async fn apply_engagement(
        &self,
        id: &UserId,
        points_delta: u32,
        streak: StreakState,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError>;
}

/// Fixture implementation for tests that do not exercise profile storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserProfileRepository;

#[async_trait]
impl UserProfileRepository for FixtureUserProfileRepository {
    async fn create(&self, _profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        _id: &UserId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(None)
    }

    async fn find_by_anonymous_id(
        &self,
        _anonymous_id: &AnonymousId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(None)
    }

    async fn find_by_username(
        &self,
        _username: &Username,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(None)
    }

    async fn find_many(
        &self,
        _ids: &[UserId],
    ) -> Result<Vec<UserProfile>, UserProfileRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_attributes(
        &self,
        _profile: &UserProfile,
    ) -> Result<(), UserProfileRepositoryError> {
        Ok(())
    }

    async fn apply_engagement(
        &self,
        _id: &UserId,
        _points_delta: u32,
        _streak: StreakState,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(None)
    }
}
