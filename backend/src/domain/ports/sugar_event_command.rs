//! Driving port for logging sugar events.
//!
//! Logging an event scores it, links a crushed spike, advances the streak,
//! and returns everything the caller needs to render the outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Error, InputMethod, PointsCalculator, PointsContext, StreakState, StreakTracker, SugarEvent,
    SugarEventDraft, SugarEventId, SugarGrams, UserId,
};

/// Request to log one event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSugarEventRequest {
    pub user_id: UserId,
    pub item_name: String,
    pub sugar_grams: f64,
    pub method: InputMethod,
    pub calories: Option<f64>,
    pub category: Option<String>,
    /// Defaults to the service clock when absent.
    pub timestamp: Option<DateTime<Utc>>,
    pub is_recommendation: bool,
}

impl LogSugarEventRequest {
    /// Validate into a draft stamped with `timestamp` when the request has none.
    pub fn into_draft(self, now: DateTime<Utc>) -> Result<SugarEventDraft, Error> {
        let sugar_grams = SugarGrams::new(self.sugar_grams)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        Ok(SugarEventDraft {
            user_id: self.user_id,
            timestamp: self.timestamp.unwrap_or(now),
            item_name: self.item_name,
            sugar_grams,
            calories: self.calories,
            category: self.category,
            method: self.method,
            is_recommendation: self.is_recommendation,
        })
    }
}

/// Outcome of logging one event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSugarEventResponse {
    /// The scored event as stored.
    pub event: SugarEvent,
    pub points_earned: u32,
    /// Reasons in rule order.
    pub points_messages: Vec<String>,
    /// Streak after the event.
    pub streak: u32,
    /// Lifetime points after the event.
    pub total_points: u64,
    /// Earlier spike retroactively marked as corrected by this event.
    pub corrected_event_id: Option<SugarEventId>,
}

/// Driving port for event writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SugarEventCommand: Send + Sync {
    /// Persist, score, and apply one event.
    ///
    /// Validation failures map to `invalid_request`, unknown users to
    /// `not_found`, and store outages to `service_unavailable`.
    async fn log_event(&self, request: LogSugarEventRequest)
    -> Result<LogSugarEventResponse, Error>;
}

/// Fixture command that scores in isolation, as if it were the first log ever.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSugarEventCommand;

#[async_trait]
impl SugarEventCommand for FixtureSugarEventCommand {
    async fn log_event(
        &self,
        request: LogSugarEventRequest,
    ) -> Result<LogSugarEventResponse, Error> {
        let draft = request.into_draft(Utc::now())?;
        let mut event = SugarEvent::pending(SugarEventId::random(), draft)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let award = PointsCalculator::default().evaluate(&event, &PointsContext::default());
        event.score(award.points());
        let streak = StreakTracker
            .advance(StreakState::default(), event.timestamp().date_naive())
            .state();
        Ok(LogSugarEventResponse {
            points_earned: award.points(),
            points_messages: award.messages(),
            streak: streak.current,
            total_points: u64::from(award.points()),
            corrected_event_id: None,
            event,
        })
    }
}
