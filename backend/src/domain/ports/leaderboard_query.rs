//! Driving port for leaderboard reads.

use async_trait::async_trait;

use crate::domain::{Error, LeaderboardEntry, LeaderboardTimeframe};

/// Driving port computing a leaderboard snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardQuery: Send + Sync {
    /// Top users by points earned inside `timeframe`, recomputed per call.
    async fn leaderboard(
        &self,
        timeframe: LeaderboardTimeframe,
    ) -> Result<Vec<LeaderboardEntry>, Error>;
}

/// Fixture query returning an empty board.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLeaderboardQuery;

#[async_trait]
impl LeaderboardQuery for FixtureLeaderboardQuery {
    async fn leaderboard(
        &self,
        _timeframe: LeaderboardTimeframe,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        Ok(Vec::new())
    }
}
