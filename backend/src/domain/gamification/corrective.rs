//! Retroactive linking of an activity to the spike it neutralised.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{SugarEventRepository, SugarEventRepositoryError};
use crate::domain::sugar_event::SugarEventId;

use super::points::PointsAward;

/// Flags the prior spike named by a [`PointsAward`].
///
/// The flag flip is the only mutation ever applied to an existing event.
pub struct CorrectiveActionLinker<R> {
    events: Arc<R>,
}

impl<R> Clone for CorrectiveActionLinker<R> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<R> CorrectiveActionLinker<R>
where
    R: SugarEventRepository,
{
    pub fn new(events: Arc<R>) -> Self {
        Self { events }
    }

    /// Flag the award's corrective target, if any.
    ///
    /// Returns the flagged event id. A target that has vanished from the
    /// store is skipped; flagging an already flagged event is a no-op.
    pub async fn link(
        &self,
        award: &PointsAward,
    ) -> Result<Option<SugarEventId>, SugarEventRepositoryError> {
        let Some(target) = award.corrective_target() else {
            return Ok(None);
        };
        if !self.events.mark_corrective_action(&target).await? {
            return Ok(None);
        }
        info!(event_id = %target, "spike marked as corrected");
        Ok(Some(target))
    }
}
