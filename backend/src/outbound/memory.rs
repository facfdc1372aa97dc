//! In-process event store implementing both driven ports.
//!
//! Used when no database URL is configured and by integration tests. One
//! lock guards profiles and events together, so each port call is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{
    SugarEventRepository, SugarEventRepositoryError, UserProfileRepository,
    UserProfileRepositoryError,
};
use crate::domain::{
    AnonymousId, StreakState, SugarEvent, SugarEventId, UserId, UserPointsTotal, UserProfile,
    Username,
};

#[derive(Debug, Default)]
struct StoreState {
    profiles: HashMap<UserId, UserProfile>,
    events: HashMap<SugarEventId, SugarEvent>,
}

impl StoreState {
    fn events_of<'a>(&'a self, user_id: &'a UserId) -> impl Iterator<Item = &'a SugarEvent> + 'a {
        self.events
            .values()
            .filter(move |event| event.user_id() == *user_id)
    }

    fn check_unique(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        let others = self
            .profiles
            .values()
            .filter(|other| other.id() != profile.id());
        for other in others {
            if other.anonymous_id() == profile.anonymous_id() {
                return Err(UserProfileRepositoryError::duplicate_anonymous_id(
                    profile.anonymous_id().to_string(),
                ));
            }
            let username = profile.username();
            if username.is_some() && other.username() == username {
                return Err(UserProfileRepositoryError::duplicate_username(
                    username.map(ToString::to_string).unwrap_or_default(),
                ));
            }
        }
        Ok(())
    }
}

/// Event store held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryEngagementStore {
    state: RwLock<StoreState>,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SugarEventRepository for InMemoryEngagementStore {
    async fn insert(&self, event: &SugarEvent) -> Result<(), SugarEventRepositoryError> {
        let mut state = self.state.write().await;
        if state.events.contains_key(&event.id()) {
            return Err(SugarEventRepositoryError::query(format!(
                "event {} already exists",
                event.id()
            )));
        }
        state.events.insert(event.id(), event.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError> {
        Ok(self.state.read().await.events.get(id).cloned())
    }

    async fn count_for_user_between(
        &self,
        user_id: &UserId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, SugarEventRepositoryError> {
        let state = self.state.read().await;
        let count = state
            .events_of(user_id)
            .filter(|event| event.timestamp() >= from && event.timestamp() < until)
            .count();
        Ok(count as u64)
    }

    async fn latest_before(
        &self,
        user_id: &UserId,
        before: DateTime<Utc>,
        exclude: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError> {
        let state = self.state.read().await;
        let latest = state
            .events_of(user_id)
            .filter(|event| event.timestamp() < before && event.id() != *exclude)
            .max_by_key(|event| (event.timestamp(), event.id()))
            .cloned();
        Ok(latest)
    }

    async fn record_points(
        &self,
        id: &SugarEventId,
        points: u32,
    ) -> Result<bool, SugarEventRepositoryError> {
        let mut state = self.state.write().await;
        Ok(state
            .events
            .get_mut(id)
            .is_some_and(|event| event.score(points)))
    }

    async fn mark_corrective_action(
        &self,
        id: &SugarEventId,
    ) -> Result<bool, SugarEventRepositoryError> {
        let mut state = self.state.write().await;
        let Some(event) = state.events.get_mut(id) else {
            return Ok(false);
        };
        event.mark_corrective_action();
        Ok(true)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError> {
        let state = self.state.read().await;
        let mut events: Vec<SugarEvent> = state.events_of(user_id).cloned().collect();
        events.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(events)
    }

    async fn points_by_user_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserPointsTotal>, SugarEventRepositoryError> {
        let state = self.state.read().await;
        let mut totals: HashMap<UserId, UserPointsTotal> = HashMap::new();
        for event in state.events.values().filter(|e| e.timestamp() >= since) {
            let points = u64::from(event.points_earned().unwrap_or(0));
            totals
                .entry(event.user_id())
                .and_modify(|total| {
                    total.points += points;
                    total.last_event_at = total.last_event_at.max(event.timestamp());
                })
                .or_insert(UserPointsTotal {
                    user_id: event.user_id(),
                    points,
                    last_event_at: event.timestamp(),
                });
        }
        Ok(totals.into_values().collect())
    }

    async fn list_unscored(
        &self,
        limit: usize,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError> {
        let state = self.state.read().await;
        let mut pending: Vec<SugarEvent> = state
            .events
            .values()
            .filter(|event| !event.is_scored())
            .cloned()
            .collect();
        pending.sort_by_key(|event| (event.timestamp(), event.id()));
        pending.truncate(limit);
        Ok(pending)
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryEngagementStore {
    async fn create(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        let mut state = self.state.write().await;
        state.check_unique(profile)?;
        state.profiles.insert(profile.id(), profile.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(self.state.read().await.profiles.get(id).cloned())
    }

    async fn find_by_anonymous_id(
        &self,
        anonymous_id: &AnonymousId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .values()
            .find(|profile| profile.anonymous_id() == anonymous_id)
            .cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .values()
            .find(|profile| profile.username() == Some(username))
            .cloned())
    }

    async fn find_many(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserProfile>, UserProfileRepositoryError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }

    async fn update_attributes(
        &self,
        profile: &UserProfile,
    ) -> Result<(), UserProfileRepositoryError> {
        let mut state = self.state.write().await;
        state.check_unique(profile)?;
        let Some(stored) = state.profiles.get_mut(&profile.id()) else {
            return Ok(());
        };
        let mut record = profile.record().clone();
        record.points = stored.points();
        record.streak = stored.streak();
        *stored = UserProfile::restore(record);
        Ok(())
    }

    async fn apply_engagement(
        &self,
        id: &UserId,
        points_delta: u32,
        streak: StreakState,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.profiles.get_mut(id).map(|profile| {
            profile.apply_engagement(points_delta, streak);
            profile.clone()
        }))
    }
}
