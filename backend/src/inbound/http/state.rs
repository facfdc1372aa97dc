//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FixtureLeaderboardQuery, FixtureSugarEventCommand, FixtureSugarEventQuery,
    FixtureUserAccountCommand, FixtureUserAccountQuery, LeaderboardQuery, SugarEventCommand,
    SugarEventQuery, UserAccountCommand, UserAccountQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sugar_events: Arc<dyn SugarEventCommand>,
    pub sugar_events_query: Arc<dyn SugarEventQuery>,
    pub leaderboard: Arc<dyn LeaderboardQuery>,
    pub accounts: Arc<dyn UserAccountCommand>,
    pub accounts_query: Arc<dyn UserAccountQuery>,
}

impl HttpState {
    /// Build state where every port is a fixture.
    ///
    /// # Examples
    /// ```
    /// use sugar_spike::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::fixtures();
    /// let _leaderboard = state.leaderboard.clone();
    /// ```
    pub fn fixtures() -> Self {
        Self {
            sugar_events: Arc::new(FixtureSugarEventCommand),
            sugar_events_query: Arc::new(FixtureSugarEventQuery),
            leaderboard: Arc::new(FixtureLeaderboardQuery),
            accounts: Arc::new(FixtureUserAccountCommand),
            accounts_query: Arc::new(FixtureUserAccountQuery),
        }
    }

    /// Wire one engagement service and one account service into every port.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use sugar_spike::domain::{EngagementService, UserAccountService};
    /// use sugar_spike::inbound::http::state::HttpState;
    /// use sugar_spike::outbound::memory::InMemoryEngagementStore;
    ///
    /// let store = Arc::new(InMemoryEngagementStore::default());
    /// let engagement = Arc::new(EngagementService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let accounts = Arc::new(UserAccountService::new(store));
    /// let _state = HttpState::from_services(engagement, accounts);
    /// ```
    pub fn from_services<E, A>(engagement: Arc<E>, accounts: Arc<A>) -> Self
    where
        E: SugarEventCommand + SugarEventQuery + LeaderboardQuery + 'static,
        A: UserAccountCommand + UserAccountQuery + 'static,
    {
        Self {
            sugar_events: engagement.clone(),
            sugar_events_query: engagement.clone(),
            leaderboard: engagement,
            accounts: accounts.clone(),
            accounts_query: accounts,
        }
    }
}
