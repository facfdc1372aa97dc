//! Driving port for event history reads.

use async_trait::async_trait;

use crate::domain::{Error, SugarEvent, UserId};

/// Driving port for reading a user's logged events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SugarEventQuery: Send + Sync {
    /// Events of a user, newest first.
    async fn list_events(&self, user_id: &UserId) -> Result<Vec<SugarEvent>, Error>;
}

/// Fixture query with an empty history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSugarEventQuery;

#[async_trait]
impl SugarEventQuery for FixtureSugarEventQuery {
    async fn list_events(&self, _user_id: &UserId) -> Result<Vec<SugarEvent>, Error> {
        Ok(Vec::new())
    }
}
