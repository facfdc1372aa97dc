//! Day-granular logging streak state machine.

use chrono::NaiveDate;

/// Streak state stored on a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub last_log_date: Option<NaiveDate>,
}

/// Outcome of feeding one event date into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Logged the calendar day after the last log.
    Continued(StreakState),
    /// First log ever, or a gap of more than one day.
    Reset(StreakState),
    /// Another log on the last logged day.
    SameDay(StreakState),
    /// An event dated before the last logged day.
    Backdated(StreakState),
}

impl StreakTransition {
    /// State to persist after the transition.
    pub fn state(&self) -> StreakState {
        match self {
            Self::Continued(state)
            | Self::Reset(state)
            | Self::SameDay(state)
            | Self::Backdated(state) => *state,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Continued(_) | Self::Reset(_))
    }
}

/// Applies the streak rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakTracker;

impl StreakTracker {
    pub fn advance(&self, state: StreakState, event_date: NaiveDate) -> StreakTransition {
        let Some(last) = state.last_log_date else {
            return StreakTransition::Reset(StreakState {
                current: 1,
                last_log_date: Some(event_date),
            });
        };

        if event_date == last {
            return StreakTransition::SameDay(state);
        }
        if event_date < last {
            return StreakTransition::Backdated(state);
        }
        if last.succ_opt() == Some(event_date) {
            StreakTransition::Continued(StreakState {
                current: state.current.saturating_add(1),
                last_log_date: Some(event_date),
            })
        } else {
            StreakTransition::Reset(StreakState {
                current: 1,
                last_log_date: Some(event_date),
            })
        }
    }
}
