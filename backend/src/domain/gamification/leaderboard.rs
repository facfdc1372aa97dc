//! Leaderboard windows and ranking.
//!
//! Totals are always summed from event points; nothing here is cached.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::calendar::LocalCalendar;
use crate::domain::user::{UserId, UserProfile};

/// Number of entries returned by a leaderboard query.
pub const LEADERBOARD_LIMIT: usize = 10;

/// Window over which points are summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardTimeframe {
    /// Since local midnight today.
    #[default]
    Daily,
    /// Since local midnight on the first of the month.
    Monthly,
}

impl LeaderboardTimeframe {
    /// Parse a query selector; unknown or absent values mean daily.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("monthly") => Self::Monthly,
            _ => Self::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for LeaderboardTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points summed for one user inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPointsTotal {
    pub user_id: UserId,
    pub points: u64,
    /// Latest event counted in the window.
    pub last_event_at: DateTime<Utc>,
}

/// A ranked leaderboard row joined with display identity.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub username: Option<String>,
    pub name: String,
    pub avatar: String,
    pub xp: u64,
}

/// Computes windows and ranks totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderboardAggregator {
    calendar: LocalCalendar,
}

impl LeaderboardAggregator {
    pub fn new(calendar: LocalCalendar) -> Self {
        Self { calendar }
    }

    /// Inclusive lower bound of the window containing `now`.
    pub fn window_start(&self, timeframe: LeaderboardTimeframe, now: DateTime<Utc>) -> DateTime<Utc> {
        match timeframe {
            LeaderboardTimeframe::Daily => self.calendar.start_of_day(now),
            LeaderboardTimeframe::Monthly => self.calendar.start_of_month(now),
        }
    }

    /// Sort by points descending and keep the top [`LEADERBOARD_LIMIT`].
    ///
    /// Equal totals rank the user whose latest counted event came first
    /// ahead, then fall back to the user id.
    pub fn rank(&self, mut totals: Vec<UserPointsTotal>) -> Vec<UserPointsTotal> {
        totals.sort_by(compare_totals);
        totals.truncate(LEADERBOARD_LIMIT);
        totals
    }

    /// Join ranked totals with profiles, dropping users without one.
    pub fn assemble(
        &self,
        ranked: &[UserPointsTotal],
        profiles: Vec<UserProfile>,
    ) -> Vec<LeaderboardEntry> {
        let mut by_id: HashMap<UserId, UserProfile> = profiles
            .into_iter()
            .map(|profile| (profile.id(), profile))
            .collect();
        ranked
            .iter()
            .filter_map(|total| {
                by_id.remove(&total.user_id).map(|profile| LeaderboardEntry {
                    user_id: total.user_id,
                    username: profile.username().map(ToString::to_string),
                    name: profile.name().to_owned(),
                    avatar: profile.avatar().to_owned(),
                    xp: total.points,
                })
            })
            .collect()
    }
}

fn compare_totals(a: &UserPointsTotal, b: &UserPointsTotal) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.last_event_at.cmp(&b.last_event_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 14, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn total(seed: u128, points: u64, minutes: i64) -> UserPointsTotal {
        UserPointsTotal {
            user_id: UserId::from_uuid(Uuid::from_u128(seed)),
            points,
            last_event_at: base() + Duration::minutes(minutes),
        }
    }

    #[rstest]
    #[case(None, LeaderboardTimeframe::Daily)]
    #[case(Some("monthly"), LeaderboardTimeframe::Monthly)]
    #[case(Some(" Monthly "), LeaderboardTimeframe::Monthly)]
    #[case(Some("weekly"), LeaderboardTimeframe::Daily)]
    fn selector_defaults_to_daily(
        #[case] selector: Option<&str>,
        #[case] expected: LeaderboardTimeframe,
    ) {
        assert_eq!(LeaderboardTimeframe::from_selector(selector), expected);
    }

    #[rstest]
    fn windows_follow_calendar() {
        let aggregator = LeaderboardAggregator::new(LocalCalendar::utc());
        let daily = aggregator.window_start(LeaderboardTimeframe::Daily, base());
        let monthly = aggregator.window_start(LeaderboardTimeframe::Monthly, base());
        assert_eq!(
            daily,
            Utc.with_ymd_and_hms(2026, 6, 15, 0, 0, 0).single().expect("instant")
        );
        assert_eq!(
            monthly,
            Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).single().expect("instant")
        );
    }

    #[rstest]
    fn rank_truncates_and_orders_descending() {
        let totals = (0..15).map(|n| total(n, u64::from(n as u32) * 3, 0)).collect();
        let ranked = LeaderboardAggregator::default().rank(totals);
        assert_eq!(ranked.len(), LEADERBOARD_LIMIT);
        assert!(ranked.windows(2).all(|pair| pair[0].points >= pair[1].points));
        assert_eq!(ranked[0].points, 42);
    }

    #[rstest]
    fn ties_prefer_earlier_last_event_then_id() {
        let ranked = LeaderboardAggregator::default().rank(vec![
            total(3, 20, 5),
            total(2, 20, 1),
            total(1, 20, 5),
            total(4, 25, 9),
        ]);
        let order: Vec<u128> = ranked
            .iter()
            .map(|entry| entry.user_id.as_uuid().as_u128())
            .collect();
        assert_eq!(order, vec![4, 2, 1, 3]);
    }
}
