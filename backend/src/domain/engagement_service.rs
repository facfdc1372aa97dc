//! Engagement domain service.
//!
//! Orchestrates the gamification engine around the event store: logging and
//! scoring events, event history, leaderboards, and repair of events left
//! unscored by a failed log.
//!
//! Logging runs as a short saga under the user's lock:
//! 1. insert the event unscored;
//! 2. read the scoring context and evaluate the points rules;
//! 3. flag a crushed spike;
//! 4. record the points (only while still unscored);
//! 5. add the points and the streak transition to the profile atomically.
//!
//! A failure after step 1 leaves an unscored event behind, which
//! [`ScoringRepair`] later finishes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    LeaderboardQuery, LogSugarEventRequest, LogSugarEventResponse, RepairReport, ScoringRepair,
    SugarEventCommand, SugarEventQuery, SugarEventRepository, UserProfileRepository,
};
use crate::domain::store_deadline::StoreDeadline;
use crate::domain::user_locks::UserLocks;
use crate::domain::{
    CorrectiveActionLinker, Error, LeaderboardAggregator, LeaderboardEntry, LeaderboardTimeframe,
    LocalCalendar, PointsAward, PointsCalculator, PointsContext, StreakTracker, StreakTransition,
    SugarEvent, SugarEventId, UserId, UserProfile,
};

/// Result of scoring one stored event.
struct ScoredEvent {
    event: SugarEvent,
    award: PointsAward,
    /// Prior spike flagged by this event, if any.
    corrected: Option<SugarEventId>,
    transition: StreakTransition,
    profile: UserProfile,
}

/// Engagement service implementing the event, leaderboard, and repair ports.
pub struct EngagementService<E, U> {
    events: Arc<E>,
    users: Arc<U>,
    linker: CorrectiveActionLinker<E>,
    clock: Arc<dyn Clock>,
    calendar: LocalCalendar,
    deadline: StoreDeadline,
    locks: Arc<UserLocks>,
}

impl<E, U> Clone for EngagementService<E, U> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            users: Arc::clone(&self.users),
            linker: self.linker.clone(),
            clock: Arc::clone(&self.clock),
            calendar: self.calendar,
            deadline: self.deadline,
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<E, U> EngagementService<E, U>
where
    E: SugarEventRepository,
    U: UserProfileRepository,
{
    /// Create a service on the UTC calendar with the default store deadline.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use sugar_spike::domain::EngagementService;
    /// # use sugar_spike::outbound::memory::InMemoryEngagementStore;
    /// let store = Arc::new(InMemoryEngagementStore::default());
    /// let service = EngagementService::new(store.clone(), store, Arc::new(DefaultClock));
    /// # let _ = service;
    /// ```
    pub fn new(events: Arc<E>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            linker: CorrectiveActionLinker::new(Arc::clone(&events)),
            events,
            users,
            clock,
            calendar: LocalCalendar::utc(),
            deadline: StoreDeadline::default(),
            locks: Arc::new(UserLocks::new()),
        }
    }

    /// Use `calendar` for day boundaries and the early-bird hour.
    pub fn with_calendar(mut self, calendar: LocalCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Bound each store call by `timeout`.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = StoreDeadline::new(timeout);
        self
    }

    /// Share per-user locks with another service instance.
    pub fn with_locks(mut self, locks: Arc<UserLocks>) -> Self {
        self.locks = locks;
        self
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, Error> {
        self.deadline
            .run("load profile", self.users.find_by_id(user_id))
            .await
    }

    async fn points_context(&self, event: &SugarEvent) -> Result<PointsContext, Error> {
        let user_id = event.user_id();
        let day_start = self.calendar.start_of_day(event.timestamp());
        let same_day_prior_count = self
            .deadline
            .run(
                "count same-day events",
                self.events
                    .count_for_user_between(&user_id, day_start, event.timestamp()),
            )
            .await?;
        let previous_event = self
            .deadline
            .run(
                "load previous event",
                self.events
                    .latest_before(&user_id, event.timestamp(), &event.id()),
            )
            .await?;
        Ok(PointsContext {
            same_day_prior_count,
            previous_event,
        })
    }

    /// Score a stored, unscored event and apply it to `profile`.
    ///
    /// Returns `None` when another writer scored the event first.
    async fn score_and_apply(
        &self,
        mut event: SugarEvent,
        profile: &UserProfile,
    ) -> Result<Option<ScoredEvent>, Error> {
        let context = self.points_context(&event).await?;
        let award = PointsCalculator::new(self.calendar).evaluate(&event, &context);

        let corrected = self
            .deadline
            .run("link corrective action", self.linker.link(&award))
            .await?;

        let recorded = self
            .deadline
            .run(
                "record points",
                self.events.record_points(&event.id(), award.points()),
            )
            .await?;
        if !recorded {
            debug!(event_id = %event.id(), "event already scored; skipping profile update");
            return Ok(None);
        }
        event.score(award.points());

        let event_date = self.calendar.local_date(event.timestamp());
        let transition = StreakTracker.advance(profile.streak(), event_date);
        let updated = self
            .deadline
            .run(
                "apply engagement",
                self.users
                    .apply_engagement(&profile.id(), award.points(), transition.state()),
            )
            .await?
            .ok_or_else(|| Error::not_found(format!("user {} not found", profile.id())))?;

        Ok(Some(ScoredEvent {
            event,
            award,
            corrected,
            transition,
            profile: updated,
        }))
    }
}

#[async_trait]
impl<E, U> SugarEventCommand for EngagementService<E, U>
where
    E: SugarEventRepository,
    U: UserProfileRepository,
{
    async fn log_event(
        &self,
        request: LogSugarEventRequest,
    ) -> Result<LogSugarEventResponse, Error> {
        let draft = request.into_draft(self.clock.utc())?;
        let event = SugarEvent::pending(SugarEventId::random(), draft)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let user_id = event.user_id();

        let _guard = self.locks.acquire(user_id).await;
        let profile = self
            .load_profile(&user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;

        self.deadline
            .run("insert event", self.events.insert(&event))
            .await?;
        let event_id = event.id();
        let scored = self
            .score_and_apply(event, &profile)
            .await?
            .ok_or_else(|| Error::internal(format!("event {event_id} was scored concurrently")))?;

        let ScoredEvent {
            event,
            award,
            corrected,
            transition,
            profile,
        } = scored;
        info!(
            user_id = %user_id,
            event_id = %event.id(),
            points = award.points(),
            streak = profile.streak().current,
            streak_changed = transition.is_mutation(),
            "sugar event logged"
        );
        Ok(LogSugarEventResponse {
            points_earned: award.points(),
            points_messages: award.messages(),
            streak: profile.streak().current,
            total_points: profile.points(),
            corrected_event_id: corrected,
            event,
        })
    }
}

#[async_trait]
impl<E, U> SugarEventQuery for EngagementService<E, U>
where
    E: SugarEventRepository,
    U: UserProfileRepository,
{
    async fn list_events(&self, user_id: &UserId) -> Result<Vec<SugarEvent>, Error> {
        self.deadline
            .run("list events", self.events.list_for_user(user_id))
            .await
    }
}

#[async_trait]
impl<E, U> LeaderboardQuery for EngagementService<E, U>
where
    E: SugarEventRepository,
    U: UserProfileRepository,
{
    async fn leaderboard(
        &self,
        timeframe: LeaderboardTimeframe,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        let aggregator = LeaderboardAggregator::new(self.calendar);
        let since = aggregator.window_start(timeframe, self.clock.utc());
        let totals = self
            .deadline
            .run("sum points", self.events.points_by_user_since(since))
            .await?;
        let ranked = aggregator.rank(totals);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = ranked.iter().map(|total| total.user_id).collect();
        let profiles = self
            .deadline
            .run("load leaderboard profiles", self.users.find_many(&ids))
            .await?;
        let entries = aggregator.assemble(&ranked, profiles);
        debug!(%timeframe, entries = entries.len(), "leaderboard computed");
        Ok(entries)
    }
}

#[async_trait]
impl<E, U> ScoringRepair for EngagementService<E, U>
where
    E: SugarEventRepository,
    U: UserProfileRepository,
{
    async fn repair_unscored(&self, limit: usize) -> Result<RepairReport, Error> {
        let pending = self
            .deadline
            .run("list unscored events", self.events.list_unscored(limit))
            .await?;
        let mut report = RepairReport {
            examined: pending.len(),
            ..RepairReport::default()
        };

        for event in pending {
            let user_id = event.user_id();
            let _guard = self.locks.acquire(user_id).await;
            let Some(profile) = self.load_profile(&user_id).await? else {
                warn!(user_id = %user_id, event_id = %event.id(), "unscored event has no owner");
                report.orphaned += 1;
                continue;
            };
            if let Some(scored) = self.score_and_apply(event, &profile).await? {
                info!(
                    user_id = %user_id,
                    event_id = %scored.event.id(),
                    points = scored.award.points(),
                    "unscored event repaired"
                );
                report.repaired += 1;
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "engagement_service_tests.rs"]
mod tests;
