//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod leaderboard_query;
mod scoring_repair;
mod sugar_event_command;
mod sugar_event_query;
mod sugar_event_repository;
mod user_account_command;
mod user_account_query;
mod user_profile_repository;

#[cfg(test)]
pub use leaderboard_query::MockLeaderboardQuery;
pub use leaderboard_query::{FixtureLeaderboardQuery, LeaderboardQuery};
#[cfg(test)]
pub use scoring_repair::MockScoringRepair;
pub use scoring_repair::{FixtureScoringRepair, RepairReport, ScoringRepair};
#[cfg(test)]
pub use sugar_event_command::MockSugarEventCommand;
pub use sugar_event_command::{
    FixtureSugarEventCommand, LogSugarEventRequest, LogSugarEventResponse, SugarEventCommand,
};
#[cfg(test)]
pub use sugar_event_query::MockSugarEventQuery;
pub use sugar_event_query::{FixtureSugarEventQuery, SugarEventQuery};
#[cfg(test)]
pub use sugar_event_repository::MockSugarEventRepository;
pub use sugar_event_repository::{
    FixtureSugarEventRepository, SugarEventRepository, SugarEventRepositoryError,
};
#[cfg(test)]
pub use user_account_command::MockUserAccountCommand;
pub use user_account_command::{FixtureUserAccountCommand, UserAccountCommand};
#[cfg(test)]
pub use user_account_query::MockUserAccountQuery;
pub use user_account_query::{FixtureUserAccountQuery, UserAccountQuery};
#[cfg(test)]
pub use user_profile_repository::MockUserProfileRepository;
pub use user_profile_repository::{
    FixtureUserProfileRepository, UserProfileRepository, UserProfileRepositoryError,
};
