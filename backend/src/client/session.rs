//! A signed-in user's session: local state plus the gateway that confirms it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;
use tracing::{debug, warn};

use super::gateway::{EngagementGateway, GatewayError};
use super::state::{ClientEventId, ClientState, OptimisticEvent};
use crate::domain::LeaderboardTimeframe;
use crate::inbound::http::sugar_events::LogSugarEventBody;

/// Result of [`ClientSession::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// The server confirmed the entry and its fields were applied.
    Reconciled(ClientEventId),
    /// The entry was removed locally before the server answered.
    Discarded(ClientEventId),
    /// An entry with the same timestamp is already shown.
    Duplicate,
}

/// Drives optimistic logging against an [`EngagementGateway`].
pub struct ClientSession<G> {
    user_id: String,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    state: Mutex<ClientState>,
}

impl<G> ClientSession<G>
where
    G: EngagementGateway,
{
    pub fn new(
        user_id: impl Into<String>,
        gateway: Arc<G>,
        clock: Arc<dyn Clock>,
        state: ClientState,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            gateway,
            clock,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the current local state.
    pub fn with_state<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        f(&self.state())
    }

    /// Show `event` at once, then apply the server's outcome.
    ///
    /// The entry stays visible as unreconciled when the request fails.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after marking the entry.
    pub async fn log(&self, event: OptimisticEvent) -> Result<LogOutcome, GatewayError> {
        let body = LogSugarEventBody {
            user_id: Some(self.user_id.clone()),
            food_name: Some(event.food_name.clone()),
            sugar_grams: Some(event.sugar_grams),
            method: Some(event.method.as_str().to_owned()),
            calories: event.calories,
            category: event.category.clone(),
            timestamp: Some(event.timestamp.to_rfc3339()),
            is_recommendation: Some(event.is_recommendation),
        };
        let Some(client_id) = self.state().apply_optimistic(event) else {
            return Ok(LogOutcome::Duplicate);
        };

        match self.gateway.log_event(body).await {
            Ok(response) => {
                let now = self.clock.utc();
                if self.state().reconcile(client_id, response, now) {
                    Ok(LogOutcome::Reconciled(client_id))
                } else {
                    debug!(?client_id, "discarding outcome for removed entry");
                    Ok(LogOutcome::Discarded(client_id))
                }
            }
            Err(error) => {
                warn!(%error, ?client_id, "sugar event not confirmed");
                self.state().mark_unreconciled(client_id);
                Err(error)
            }
        }
    }

    /// Remove an entry from the local view.
    pub fn remove(&self, client_id: ClientEventId) -> bool {
        self.state().remove(client_id).is_some()
    }

    /// Replace local history with the server's.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; local history is left untouched.
    pub async fn refresh_history(&self) -> Result<(), GatewayError> {
        let events = self.gateway.list_events(self.user_id.clone()).await?;
        self.state().replace_history(events);
        Ok(())
    }

    /// Refresh leaderboard standings for `timeframe`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the previous standings are kept.
    pub async fn refresh_leaderboard(
        &self,
        timeframe: LeaderboardTimeframe,
    ) -> Result<(), GatewayError> {
        let entries = self.gateway.leaderboard(timeframe).await?;
        self.state().set_leaderboard(entries);
        Ok(())
    }

    /// Drop an expired notification.
    pub fn tick(&self) {
        let now = self.clock.utc();
        self.state().dismiss_expired(now);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use mockable::MockClock;
    use rstest::rstest;
    use tokio::sync::oneshot;

    use super::*;
    use crate::client::gateway::MockEngagementGateway;
    use crate::client::state::SyncStatus;
    use crate::domain::{InputMethod, LocalCalendar};
    use crate::inbound::http::sugar_events::{LogSugarEventResponseBody, SugarEventBody};

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0)
            .single()
            .expect("valid instant")
    }

    fn clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(noon());
        Arc::new(clock)
    }

    fn apple() -> OptimisticEvent {
        OptimisticEvent {
            food_name: "Apple".to_owned(),
            sugar_grams: 3.0,
            method: InputMethod::Manual,
            calories: None,
            category: None,
            timestamp: noon(),
            is_recommendation: false,
        }
    }

    fn confirmed() -> LogSugarEventResponseBody {
        LogSugarEventResponseBody {
            event: SugarEventBody {
                id: "srv-apple".to_owned(),
                user_id: USER.to_owned(),
                food_name: "Apple".to_owned(),
                sugar_grams: 3.0,
                calories: None,
                category: None,
                method: InputMethod::Manual,
                timestamp: noon().to_rfc3339(),
                corrective_action_completed: false,
                points_earned: Some(13),
                is_recommendation: false,
            },
            points_earned: 13,
            points_messages: vec!["Healthy Choice (+5)".to_owned()],
            streak: 1,
            total_points: 13,
            corrected_event_id: None,
        }
    }

    fn session(gateway: MockEngagementGateway) -> ClientSession<MockEngagementGateway> {
        ClientSession::new(USER, Arc::new(gateway), clock(), ClientState::new(LocalCalendar::utc()))
    }

    #[rstest]
    #[tokio::test]
    async fn confirmed_log_is_reconciled() {
        let mut gateway = MockEngagementGateway::new();
        gateway
            .expect_log_event()
            .withf(|body| {
                body.user_id.as_deref() == Some(USER)
                    && body.method.as_deref() == Some("Manual")
                    && body.food_name.as_deref() == Some("Apple")
            })
            .times(1)
            .returning(|_| Ok(confirmed()));
        let session = session(gateway);

        let outcome = session.log(apple()).await.expect("logged");

        assert!(matches!(outcome, LogOutcome::Reconciled(_)));
        session.with_state(|state| {
            assert_eq!(state.history()[0].sync, SyncStatus::Reconciled);
            assert_eq!(state.xp_today(noon()), 13);
            assert_eq!(state.notification().map(|n| n.points), Some(13));
        });
    }

    #[rstest]
    #[tokio::test]
    async fn failed_log_stays_visible() {
        let mut gateway = MockEngagementGateway::new();
        gateway
            .expect_log_event()
            .returning(|_| Err(GatewayError::status(503_u16, "event store unavailable")));
        let session = session(gateway);

        let error = session.log(apple()).await.expect_err("gateway failure");

        assert!(matches!(error, GatewayError::Status { status: 503, .. }));
        session.with_state(|state| {
            assert_eq!(state.history().len(), 1);
            assert_eq!(state.history()[0].sync, SyncStatus::Unreconciled);
            assert_eq!(state.daily_sugar_total(noon()), 3.0);
        });
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_submission_skips_gateway() {
        let mut gateway = MockEngagementGateway::new();
        gateway
            .expect_log_event()
            .times(1)
            .returning(|_| Ok(confirmed()));
        let session = session(gateway);

        session.log(apple()).await.expect("first");
        let second = session.log(apple()).await.expect("second");

        assert_eq!(second, LogOutcome::Duplicate);
    }

    /// Holds the log response until released.
    struct GatedGateway {
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait::async_trait]
    impl EngagementGateway for GatedGateway {
        async fn log_event(
            &self,
            _body: LogSugarEventBody,
        ) -> Result<LogSugarEventResponseBody, GatewayError> {
            if let Some(gate) = self.gate.lock().await.take() {
                gate.await.map_err(|error| GatewayError::transport(error.to_string()))?;
            }
            Ok(confirmed())
        }

        async fn list_events(
            &self,
            _user_id: String,
        ) -> Result<Vec<SugarEventBody>, GatewayError> {
            Ok(Vec::new())
        }

        async fn leaderboard(
            &self,
            _timeframe: LeaderboardTimeframe,
        ) -> Result<Vec<crate::inbound::http::users::LeaderboardEntryBody>, GatewayError> {
            Ok(Vec::new())
        }
    }

    #[rstest]
    #[tokio::test]
    async fn removal_before_response_discards_outcome() {
        let (release, gate) = oneshot::channel();
        let gateway = GatedGateway {
            gate: tokio::sync::Mutex::new(Some(gate)),
        };
        let session = ClientSession::new(
            USER,
            Arc::new(gateway),
            clock(),
            ClientState::new(LocalCalendar::utc()),
        );

        let (outcome, removed) = tokio::join!(session.log(apple()), async {
            let id = session.with_state(|state| state.history().first().map(|e| e.client_id));
            let removed = id.is_some_and(|id| session.remove(id));
            release.send(()).expect("log still pending");
            removed
        });

        assert!(removed);
        assert!(matches!(outcome, Ok(LogOutcome::Discarded(_))));
        session.with_state(|state| {
            assert!(state.history().is_empty());
            assert!(state.notification().is_none());
        });
    }

    #[rstest]
    #[tokio::test]
    async fn history_refresh_replaces_entries() {
        let mut gateway = MockEngagementGateway::new();
        gateway
            .expect_list_events()
            .withf(|user_id| user_id == USER)
            .returning(|_| Ok(vec![confirmed().event]));
        let session = session(gateway);

        session.refresh_history().await.expect("refresh");

        session.with_state(|state| {
            assert_eq!(state.history().len(), 1);
            assert_eq!(state.history()[0].server_id.as_deref(), Some("srv-apple"));
        });
    }
}
