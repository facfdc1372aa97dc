//! Points rules for a newly logged event.
//!
//! Each rule is independent and additive. Reasons are emitted in rule order
//! and never carry a negative contribution.

use std::fmt;

use chrono::Duration;

use crate::domain::calendar::LocalCalendar;
use crate::domain::sugar_event::{SugarEvent, SugarEventId};

/// Events logged before this local hour earn the early-bird bonus.
pub const EARLY_BIRD_CUTOFF_HOUR: u32 = 18;
/// Non-exercise events below this many grams count as a healthy choice.
pub const HEALTHY_SUGAR_LIMIT_GRAMS: f64 = 5.0;
/// Prior events above this many grams are spikes.
pub const SPIKE_SUGAR_THRESHOLD_GRAMS: f64 = 20.0;
/// An activity within this many minutes of a spike crushes it.
pub const SPIKE_WINDOW_MINUTES: i64 = 30;

/// A triggered bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointsReason {
    FirstCheckIn,
    EarlyBird,
    HealthyChoice,
    ActivityBonus,
    SpikeCrushed,
}

impl PointsReason {
    pub fn points(&self) -> u32 {
        match self {
            Self::FirstCheckIn | Self::HealthyChoice | Self::ActivityBonus => 5,
            Self::EarlyBird => 3,
            Self::SpikeCrushed => 7,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::FirstCheckIn => "First Check-in",
            Self::EarlyBird => "Early Bird",
            Self::HealthyChoice => "Healthy Choice",
            Self::ActivityBonus => "Activity Bonus",
            Self::SpikeCrushed => "Spike Crushed",
        }
    }
}

impl fmt::Display for PointsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (+{})", self.label(), self.points())
    }
}

/// Store-derived context for scoring one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointsContext {
    /// Events by the same user in `[start of local day, event time)`.
    pub same_day_prior_count: u64,
    /// Most recent event strictly before the scored one.
    pub previous_event: Option<SugarEvent>,
}

/// Result of scoring one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsAward {
    reasons: Vec<PointsReason>,
    corrective_target: Option<SugarEventId>,
}

impl PointsAward {
    pub fn points(&self) -> u32 {
        self.reasons.iter().map(PointsReason::points).sum()
    }

    pub fn reasons(&self) -> &[PointsReason] {
        &self.reasons
    }

    /// Human-readable reasons in rule order.
    pub fn messages(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }

    /// Prior spike to flag as corrected, set only by the spike-crushed rule.
    pub fn corrective_target(&self) -> Option<SugarEventId> {
        self.corrective_target
    }
}

/// Pure scoring rules bound to the service calendar.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use sugar_spike::domain::{
///     InputMethod, LocalCalendar, PointsCalculator, PointsContext, SugarEvent,
///     SugarEventDraft, SugarEventId, SugarGrams, UserId,
/// };
///
/// let coffee = SugarEvent::pending(
///     SugarEventId::random(),
///     SugarEventDraft {
///         user_id: UserId::random(),
///         timestamp: Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap(),
///         item_name: "Coffee".into(),
///         sugar_grams: SugarGrams::new(4.0).unwrap(),
///         calories: None,
///         category: None,
///         method: InputMethod::Manual,
///         is_recommendation: false,
///     },
/// )
/// .unwrap();
/// let award = PointsCalculator::new(LocalCalendar::utc())
///     .evaluate(&coffee, &PointsContext::default());
/// assert_eq!(award.points(), 13);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsCalculator {
    calendar: LocalCalendar,
}

impl PointsCalculator {
    pub fn new(calendar: LocalCalendar) -> Self {
        Self { calendar }
    }

    pub fn evaluate(&self, event: &SugarEvent, context: &PointsContext) -> PointsAward {
        let mut award = PointsAward::default();

        if context.same_day_prior_count == 0 {
            award.reasons.push(PointsReason::FirstCheckIn);
        }
        if self.calendar.local_hour(event.timestamp()) < EARLY_BIRD_CUTOFF_HOUR {
            award.reasons.push(PointsReason::EarlyBird);
        }

        if !event.is_exercise() {
            if event.sugar_grams().value() < HEALTHY_SUGAR_LIMIT_GRAMS {
                award.reasons.push(PointsReason::HealthyChoice);
            }
            return award;
        }

        award.reasons.push(PointsReason::ActivityBonus);
        if let Some(spike) = context
            .previous_event
            .as_ref()
            .filter(|prior| is_crushed_spike(prior, event))
        {
            award.reasons.push(PointsReason::SpikeCrushed);
            award.corrective_target = Some(spike.id());
        }
        award
    }
}

fn is_crushed_spike(prior: &SugarEvent, activity: &SugarEvent) -> bool {
    if prior.id() == activity.id() || prior.timestamp() >= activity.timestamp() {
        return false;
    }
    let elapsed = activity.timestamp() - prior.timestamp();
    prior.sugar_grams().value() > SPIKE_SUGAR_THRESHOLD_GRAMS
        && elapsed <= Duration::minutes(SPIKE_WINDOW_MINUTES)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{InputMethod, SugarEventDraft, SugarGrams, UserId};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, hour, minute, 0)
            .single()
            .expect("valid instant")
    }

    fn event(
        user_id: UserId,
        label: &str,
        grams: f64,
        category: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> SugarEvent {
        SugarEvent::pending(
            SugarEventId::random(),
            SugarEventDraft {
                user_id,
                timestamp,
                item_name: label.to_owned(),
                sugar_grams: SugarGrams::new(grams).expect("grams"),
                calories: None,
                category: category.map(str::to_owned),
                method: InputMethod::Manual,
                is_recommendation: false,
            },
        )
        .expect("valid event")
    }

    #[fixture]
    fn calculator() -> PointsCalculator {
        PointsCalculator::new(LocalCalendar::utc())
    }

    #[rstest]
    fn first_healthy_morning_log_scores_thirteen(calculator: PointsCalculator) {
        let coffee = event(UserId::random(), "Coffee", 4.9, None, at(9, 0));
        let award = calculator.evaluate(&coffee, &PointsContext::default());
        assert_eq!(award.points(), 13);
        assert_eq!(
            award.messages(),
            vec![
                "First Check-in (+5)".to_owned(),
                "Early Bird (+3)".to_owned(),
                "Healthy Choice (+5)".to_owned(),
            ]
        );
        assert_eq!(award.corrective_target(), None);
    }

    #[rstest]
    fn walk_after_recent_spike_crushes_it(calculator: PointsCalculator) {
        let user = UserId::random();
        let soda = event(user, "Soda", 39.0, None, at(12, 0));
        let walk = event(user, "Walk", 0.0, Some("exercise"), at(12, 20));
        let award = calculator.evaluate(
            &walk,
            &PointsContext {
                same_day_prior_count: 1,
                previous_event: Some(soda.clone()),
            },
        );
        assert_eq!(
            award.reasons(),
            &[
                PointsReason::EarlyBird,
                PointsReason::ActivityBonus,
                PointsReason::SpikeCrushed,
            ]
        );
        assert_eq!(award.points(), 15);
        assert_eq!(award.corrective_target(), Some(soda.id()));
    }

    #[rstest]
    #[case(20.0, 10)]
    #[case(39.0, 31)]
    fn spike_needs_grams_above_threshold_within_window(
        calculator: PointsCalculator,
        #[case] grams: f64,
        #[case] minutes_later: u32,
    ) {
        let user = UserId::random();
        let prior = event(user, "Cake", grams, None, at(19, 0));
        let walk = event(user, "Evening walk", 0.0, None, at(19, minutes_later));
        let award = calculator.evaluate(
            &walk,
            &PointsContext {
                same_day_prior_count: 1,
                previous_event: Some(prior),
            },
        );
        assert_eq!(award.reasons(), &[PointsReason::ActivityBonus]);
        assert_eq!(award.corrective_target(), None);
    }

    #[rstest]
    fn spike_window_is_inclusive(calculator: PointsCalculator) {
        let user = UserId::random();
        let prior = event(user, "Cake", 25.0, None, at(19, 0));
        let walk = event(user, "Walk", 0.0, None, at(19, 30));
        let award = calculator.evaluate(
            &walk,
            &PointsContext {
                same_day_prior_count: 1,
                previous_event: Some(prior),
            },
        );
        assert!(award.reasons().contains(&PointsReason::SpikeCrushed));
    }

    #[rstest]
    fn exercise_never_earns_healthy_choice(calculator: PointsCalculator) {
        let walk = event(UserId::random(), "Walk", 0.0, None, at(20, 0));
        let award = calculator.evaluate(&walk, &PointsContext::default());
        assert_eq!(
            award.reasons(),
            &[PointsReason::FirstCheckIn, PointsReason::ActivityBonus]
        );
    }

    #[rstest]
    fn late_sugary_repeat_log_earns_nothing(calculator: PointsCalculator) {
        let cake = event(UserId::random(), "Cake", 30.0, None, at(21, 0));
        let award = calculator.evaluate(
            &cake,
            &PointsContext {
                same_day_prior_count: 2,
                previous_event: None,
            },
        );
        assert_eq!(award.points(), 0);
        assert!(award.messages().is_empty());
    }

    #[rstest]
    fn early_bird_uses_local_hour() {
        let calculator =
            PointsCalculator::new(LocalCalendar::from_offset_minutes(-180).expect("offset"));
        let snack = event(UserId::random(), "Cookie", 12.0, None, at(20, 0));
        let award = calculator.evaluate(
            &snack,
            &PointsContext {
                same_day_prior_count: 1,
                previous_event: None,
            },
        );
        assert_eq!(award.reasons(), &[PointsReason::EarlyBird]);
    }
}
