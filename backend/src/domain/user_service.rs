//! User account domain service.
//!
//! Implements registration, username login, and profile reads and edits.
//! Engagement totals are never written here.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{UserAccountCommand, UserAccountQuery, UserProfileRepository};
use crate::domain::store_deadline::StoreDeadline;
use crate::domain::{
    AnonymousId, Error, NewUserProfile, ProfileUpdate, UserId, UserProfile, UserValidationError,
    Username,
};

fn validation_error(err: UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn username_taken(username: &Username) -> Error {
    Error::invalid_request(format!("username {username} is already taken"))
        .with_details(json!({ "field": "username", "code": "username_taken" }))
}

/// Account service implementing the user driving ports.
#[derive(Clone)]
pub struct UserAccountService<U> {
    users: Arc<U>,
    deadline: StoreDeadline,
}

impl<U> UserAccountService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self {
            users,
            deadline: StoreDeadline::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: StoreDeadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Deadline applied to each profile store call.
    pub fn deadline(&self) -> StoreDeadline {
        self.deadline
    }
}

impl<U> UserAccountService<U>
where
    U: UserProfileRepository,
{
    async fn require_profile(&self, anonymous_id: &AnonymousId) -> Result<UserProfile, Error> {
        self.deadline
            .run(
                "load profile",
                self.users.find_by_anonymous_id(anonymous_id),
            )
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {anonymous_id} not found")))
    }

    async fn ensure_username_free(
        &self,
        username: &Username,
        owner: Option<UserId>,
    ) -> Result<(), Error> {
        let holder = self
            .deadline
            .run("check username", self.users.find_by_username(username))
            .await?;
        match holder {
            Some(existing) if Some(existing.id()) != owner => Err(username_taken(username)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<U> UserAccountCommand for UserAccountService<U>
where
    U: UserProfileRepository,
{
    async fn register(&self, new_profile: NewUserProfile) -> Result<UserProfile, Error> {
        if let Some(username) = &new_profile.username {
            self.ensure_username_free(username, None).await?;
        }
        let existing = self
            .deadline
            .run(
                "check anonymous id",
                self.users.find_by_anonymous_id(&new_profile.anonymous_id),
            )
            .await?;
        if existing.is_some() {
            return Err(Error::invalid_request(format!(
                "anonymous id {} is already registered",
                new_profile.anonymous_id
            ))
            .with_details(json!({ "field": "anonymousId", "code": "anonymous_id_taken" })));
        }

        let profile =
            UserProfile::register(UserId::random(), new_profile).map_err(validation_error)?;
        self.deadline
            .run("create profile", self.users.create(&profile))
            .await?;
        info!(user_id = %profile.id(), "user registered");
        Ok(profile)
    }

    async fn update_profile(
        &self,
        anonymous_id: &AnonymousId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, Error> {
        let mut profile = self.require_profile(anonymous_id).await?;
        if let Some(username) = &update.username {
            self.ensure_username_free(username, Some(profile.id()))
                .await?;
        }
        profile.apply_update(update).map_err(validation_error)?;
        self.deadline
            .run("update profile", self.users.update_attributes(&profile))
            .await?;
        info!(user_id = %profile.id(), "profile updated");

        // Engagement writes may land between the read and the update.
        self.deadline
            .run("reload profile", self.users.find_by_id(&profile.id()))
            .await?
            .ok_or_else(|| Error::not_found(format!("profile {anonymous_id} not found")))
    }
}

#[async_trait]
impl<U> UserAccountQuery for UserAccountService<U>
where
    U: UserProfileRepository,
{
    async fn login(&self, username: &Username) -> Result<UserProfile, Error> {
        self.deadline
            .run("find username", self.users.find_by_username(username))
            .await?
            .ok_or_else(|| Error::not_found(format!("user {username} not found")))
    }

    async fn get_profile(&self, anonymous_id: &AnonymousId) -> Result<UserProfile, Error> {
        self.require_profile(anonymous_id).await
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
