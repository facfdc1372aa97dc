//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the request and response bodies they exchange. The document backs
//! Swagger UI in debug builds and is exported by `cargo run --bin
//! openapi-dump` for client tooling.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, InputMethod};
use crate::inbound::http::sugar_events::{
    LogSugarEventBody, LogSugarEventResponseBody, SugarEventBody,
};
use crate::inbound::http::users::{
    ActivityBody, LeaderboardEntryBody, LoginBody, RegisterUserBody, UpdateProfileBody,
    UserProfileBody,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Beat the Sugar Spike engagement API",
        description = "Sugar intake logging, points, streaks, and leaderboards."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::sugar_events::log_sugar_event,
        crate::inbound::http::sugar_events::list_sugar_events,
        crate::inbound::http::users::leaderboard,
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        InputMethod,
        LogSugarEventBody,
        LogSugarEventResponseBody,
        SugarEventBody,
        ActivityBody,
        RegisterUserBody,
        UpdateProfileBody,
        LoginBody,
        UserProfileBody,
        LeaderboardEntryBody,
    )),
    tags(
        (name = "sugar-events", description = "Logging and listing intake events"),
        (name = "users", description = "Profiles, login, and leaderboards"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema field structure.

    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case::error("Error", "code")]
    #[case::error_message("Error", "message")]
    #[case::event("SugarEventBody", "foodName")]
    #[case::event_flag("SugarEventBody", "correctiveActionCompleted")]
    #[case::outcome("LogSugarEventResponseBody", "pointsMessages")]
    #[case::profile("UserProfileBody", "currentStreak")]
    #[case::leaderboard("LeaderboardEntryBody", "xp")]
    fn schemas_expose_camel_case_fields(#[case] schema: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let found = schemas.get(schema).expect("schema registered");
        assert_object_schema_has_field(found, field);
    }

    #[rstest]
    #[case("/api/v1/sugar-events")]
    #[case("/api/v1/sugar-events/{userId}")]
    #[case("/api/v1/users/leaderboard")]
    #[case("/api/v1/users/{anonymousId}")]
    #[case("/health/ready")]
    fn paths_are_registered(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
