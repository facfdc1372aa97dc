//! Port for sugar event persistence and the range queries scoring needs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{SugarEvent, SugarEventId, UserId, UserPointsTotal};

use super::define_port_error;

define_port_error! {
    /// Errors raised by sugar event repository adapters.
    pub enum SugarEventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "sugar event repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "sugar event repository query failed: {message}",
        /// The store did not answer within the configured deadline.
        Timeout { message: String } =>
            "sugar event repository timed out: {message}",
    }
}

/// Port for reading and writing sugar events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SugarEventRepository: Send + Sync {
    /// Persist a new, unscored event.
    async fn insert(&self, event: &SugarEvent) -> Result<(), SugarEventRepositoryError>;

    async fn find_by_id(
        &self,
        id: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError>;

    /// Count a user's events with `from <= timestamp < until`.
    async fn count_for_user_between(
        &self,
        user_id: &UserId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, SugarEventRepositoryError>;

    /// Most recent event of a user strictly before `before`, ignoring `exclude`.
    async fn latest_before(
        &self,
        user_id: &UserId,
        before: DateTime<Utc>,
        exclude: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError>;

    /// Set the awarded points if the event is still unscored.
    ///
    /// Returns `false` when the event is missing or already scored.
    async fn record_points(
        &self,
        id: &SugarEventId,
        points: u32,
    ) -> Result<bool, SugarEventRepositoryError>;

    /// Flag an event as neutralised. Flagging twice is a no-op.
    ///
    /// Returns `false` when the event does not exist.
    async fn mark_corrective_action(
        &self,
        id: &SugarEventId,
    ) -> Result<bool, SugarEventRepositoryError>;

    /// All events of a user, newest first (timestamp, then id, descending).
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError>;

    /// Per-user point sums over events with `timestamp >= since`.
    ///
    /// Unscored events count as zero. Users without events are absent.
    async fn points_by_user_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserPointsTotal>, SugarEventRepositoryError>;

    /// Up to `limit` unscored events, oldest first.
    async fn list_unscored(
        &self,
        limit: usize,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError>;
}

/// Fixture implementation for tests that do not exercise event persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSugarEventRepository;

#[async_trait]
impl SugarEventRepository for FixtureSugarEventRepository {
    async fn insert(&self, _event: &SugarEvent) -> Result<(), SugarEventRepositoryError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        _id: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError> {
        Ok(None)
    }

    async fn count_for_user_between(
        &self,
        _user_id: &UserId,
        _from: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> Result<u64, SugarEventRepositoryError> {
        Ok(0)
    }

    async fn latest_before(
        &self,
        _user_id: &UserId,
        _before: DateTime<Utc>,
        _exclude: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError> {
        Ok(None)
    }

    async fn record_points(
        &self,
        _id: &SugarEventId,
        _points: u32,
    ) -> Result<bool, SugarEventRepositoryError> {
        Ok(true)
    }

    async fn mark_corrective_action(
        &self,
        _id: &SugarEventId,
    ) -> Result<bool, SugarEventRepositoryError> {
        Ok(true)
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError> {
        Ok(Vec::new())
    }

    async fn points_by_user_since(
        &self,
        _since: DateTime<Utc>,
    ) -> Result<Vec<UserPointsTotal>, SugarEventRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_unscored(
        &self,
        _limit: usize,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_reads_are_empty() {
        let repo = FixtureSugarEventRepository;
        let user = UserId::random();
        let now = Utc::now();
        assert_eq!(
            repo.count_for_user_between(&user, now, now)
                .await
                .expect("fixture count"),
            0
        );
        assert!(
            repo.latest_before(&user, now, &SugarEventId::random())
                .await
                .expect("fixture latest")
                .is_none()
        );
        assert!(repo.list_unscored(5).await.expect("fixture list").is_empty());
    }

    #[rstest]
    fn timeout_error_formats_message() {
        let err = SugarEventRepositoryError::timeout("after 5000ms");
        assert_eq!(
            err.to_string(),
            "sugar event repository timed out: after 5000ms"
        );
    }
}
