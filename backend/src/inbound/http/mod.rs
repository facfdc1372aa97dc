//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod state;
pub mod sugar_events;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register the `/api/v1` scope with its JSON error handling.
///
/// `/users/leaderboard` is registered before `/users/{anonymousId}` so the
/// literal segment wins.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use sugar_spike::inbound::http::{configure_api, state::HttpState};
///
/// let _app = App::new()
///     .app_data(web::Data::new(HttpState::fixtures()))
///     .configure(configure_api);
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
            .service(sugar_events::log_sugar_event)
            .service(sugar_events::list_sugar_events)
            .service(users::leaderboard)
            .service(users::login)
            .service(users::register)
            .service(users::get_profile)
            .service(users::update_profile),
    );
}
