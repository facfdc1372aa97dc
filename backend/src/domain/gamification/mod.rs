//! Gamification engine: points, corrective links, streaks, and leaderboards.

mod corrective;
mod leaderboard;
mod points;
mod streak;

pub use corrective::CorrectiveActionLinker;
pub use leaderboard::{
    LEADERBOARD_LIMIT, LeaderboardAggregator, LeaderboardEntry, LeaderboardTimeframe,
    UserPointsTotal,
};
pub use points::{
    EARLY_BIRD_CUTOFF_HOUR, HEALTHY_SUGAR_LIMIT_GRAMS, PointsAward, PointsCalculator,
    PointsContext, PointsReason, SPIKE_SUGAR_THRESHOLD_GRAMS, SPIKE_WINDOW_MINUTES,
};
pub use streak::{StreakState, StreakTracker, StreakTransition};
