//! Driving port for recovering events left unscored by a failed log.
//!
//! Logging inserts an event before scoring it. If the process or the store
//! fails in between, the event stays with no points; repair finishes the job.

use async_trait::async_trait;

use crate::domain::Error;

/// Summary of one repair pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Unscored events found.
    pub examined: usize,
    /// Events this pass scored and applied to their profile.
    pub repaired: usize,
    /// Events whose owner no longer exists.
    pub orphaned: usize,
}

/// Driving port for the repair job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoringRepair: Send + Sync {
    /// Score up to `limit` unscored events, oldest first.
    async fn repair_unscored(&self, limit: usize) -> Result<RepairReport, Error>;
}

/// Fixture repair with nothing to do.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureScoringRepair;

#[async_trait]
impl ScoringRepair for FixtureScoringRepair {
    async fn repair_unscored(&self, _limit: usize) -> Result<RepairReport, Error> {
        Ok(RepairReport::default())
    }
}
