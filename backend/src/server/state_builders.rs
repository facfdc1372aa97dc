//! Builders wiring repositories into the HTTP state.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::info;

use sugar_spike::domain::ports::{SugarEventRepository, UserProfileRepository};
use sugar_spike::domain::{EngagementService, StoreDeadline, UserAccountService};
use sugar_spike::inbound::http::state::HttpState;
use sugar_spike::outbound::memory::InMemoryEngagementStore;
use sugar_spike::outbound::persistence::{
    DieselSugarEventRepository, DieselUserProfileRepository,
};

use super::ServerConfig;

/// Account service bound to the configured store deadline.
fn build_accounts<U>(config: &ServerConfig, users: Arc<U>) -> UserAccountService<U> {
    UserAccountService::new(users).with_deadline(StoreDeadline::new(config.store_timeout))
}

/// Wire services over one event repository and one profile repository.
fn build_services<E, U>(config: &ServerConfig, events: Arc<E>, users: Arc<U>) -> HttpState
where
    E: SugarEventRepository + 'static,
    U: UserProfileRepository + 'static,
{
    let engagement = Arc::new(
        EngagementService::new(events, Arc::clone(&users), Arc::new(DefaultClock))
            .with_calendar(config.calendar)
            .with_store_timeout(config.store_timeout),
    );
    let accounts = Arc::new(build_accounts(config, users));
    HttpState::from_services(engagement, accounts)
}

/// Build the HTTP state, using Diesel repositories when a pool is configured
/// and the in-memory store otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => {
            info!(store = "postgres", "engagement store selected");
            build_services(
                config,
                Arc::new(DieselSugarEventRepository::new(pool.clone())),
                Arc::new(DieselUserProfileRepository::new(pool.clone())),
            )
        }
        None => {
            info!(store = "memory", "engagement store selected");
            let store = Arc::new(InMemoryEngagementStore::new());
            build_services(config, Arc::clone(&store), store)
        }
    }
}
