//! Sugar event HTTP handlers.
//!
//! ```text
//! POST /api/v1/sugar-events
//! GET  /api/v1/sugar-events/{userId}
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{LogSugarEventRequest, LogSugarEventResponse};
use crate::domain::{Error, InputMethod, SugarEvent, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field_error, parse_optional_rfc3339_timestamp, parse_uuid, require,
};

/// Request payload for logging an intake or activity.
///
/// Required fields are optional here so a missing one surfaces as a
/// field-level `invalid_request` instead of a bare deserialisation failure.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogSugarEventBody {
    #[schema(format = "uuid", required = true)]
    pub user_id: Option<String>,
    #[schema(example = "Soda", required = true)]
    pub food_name: Option<String>,
    #[schema(example = 39.0, required = true)]
    pub sugar_grams: Option<f64>,
    #[schema(example = "Manual", required = true)]
    pub method: Option<String>,
    pub calories: Option<f64>,
    #[schema(example = "exercise")]
    pub category: Option<String>,
    #[schema(format = "date-time")]
    pub timestamp: Option<String>,
    pub is_recommendation: Option<bool>,
}

/// A stored sugar event.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SugarEventBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub user_id: String,
    pub food_name: String,
    pub sugar_grams: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub method: InputMethod,
    #[schema(format = "date-time")]
    pub timestamp: String,
    pub corrective_action_completed: bool,
    /// Absent until the event has been scored.
    #[serde(default)]
    pub points_earned: Option<u32>,
    pub is_recommendation: bool,
}

impl From<SugarEvent> for SugarEventBody {
    fn from(event: SugarEvent) -> Self {
        Self {
            id: event.id().to_string(),
            user_id: event.user_id().to_string(),
            food_name: event.item_name().to_owned(),
            sugar_grams: event.sugar_grams().value(),
            calories: event.calories(),
            category: event.category().map(str::to_owned),
            method: event.method(),
            timestamp: event.timestamp().to_rfc3339(),
            corrective_action_completed: event.corrective_action_completed(),
            points_earned: event.points_earned(),
            is_recommendation: event.is_recommendation(),
        }
    }
}

/// Outcome of logging one event.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogSugarEventResponseBody {
    pub event: SugarEventBody,
    pub points_earned: u32,
    #[schema(example = json!(["First Check-in (+5)", "Early Bird (+3)"]))]
    pub points_messages: Vec<String>,
    pub streak: u32,
    pub total_points: u64,
    /// Earlier spike this event retroactively corrected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(format = "uuid")]
    pub corrected_event_id: Option<String>,
}

impl From<LogSugarEventResponse> for LogSugarEventResponseBody {
    fn from(value: LogSugarEventResponse) -> Self {
        Self {
            event: SugarEventBody::from(value.event),
            points_earned: value.points_earned,
            points_messages: value.points_messages,
            streak: value.streak,
            total_points: value.total_points,
            corrected_event_id: value.corrected_event_id.map(|id| id.to_string()),
        }
    }
}

fn parse_log_request(body: LogSugarEventBody) -> Result<LogSugarEventRequest, Error> {
    let user_id = require(body.user_id, FieldName::new("userId"))?;
    let user_id = UserId::from_uuid(parse_uuid(&user_id, FieldName::new("userId"))?);
    let item_name = require(body.food_name, FieldName::new("foodName"))?;
    let sugar_grams = require(body.sugar_grams, FieldName::new("sugarGrams"))?;
    let method = require(body.method, FieldName::new("method"))?;
    let method = InputMethod::from_str(method.trim())
        .map_err(|err| invalid_field_error(FieldName::new("method"), err))?;

    Ok(LogSugarEventRequest {
        user_id,
        item_name,
        sugar_grams,
        method,
        calories: body.calories,
        category: body.category,
        timestamp: parse_optional_rfc3339_timestamp(
            body.timestamp,
            FieldName::new("timestamp"),
        )?,
        is_recommendation: body.is_recommendation.unwrap_or(false),
    })
}

/// Log an event, score it, and return the outcome.
#[utoipa::path(
    post,
    path = "/api/v1/sugar-events",
    request_body = LogSugarEventBody,
    responses(
        (status = 201, description = "Event logged and scored", body = LogSugarEventResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 503, description = "Event store unavailable", body = Error)
    ),
    tags = ["sugar-events"],
    operation_id = "logSugarEvent"
)]
#[post("/sugar-events")]
pub async fn log_sugar_event(
    state: web::Data<HttpState>,
    payload: web::Json<LogSugarEventBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_log_request(payload.into_inner())?;
    let response = state.sugar_events.log_event(request).await?;
    Ok(HttpResponse::Created().json(LogSugarEventResponseBody::from(response)))
}

/// List a user's events, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/sugar-events/{userId}",
    params(("userId" = String, Path, description = "User identifier (UUID)")),
    responses(
        (status = 200, description = "Events, newest first", body = [SugarEventBody]),
        (status = 400, description = "Invalid user id", body = Error),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Event store unavailable", body = Error)
    ),
    tags = ["sugar-events"],
    operation_id = "listSugarEvents"
)]
#[get("/sugar-events/{userId}")]
pub async fn list_sugar_events(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SugarEventBody>>> {
    let user_id = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    let events = state.sugar_events_query.list_events(&user_id).await?;
    Ok(web::Json(
        events.into_iter().map(SugarEventBody::from).collect(),
    ))
}

#[cfg(test)]
#[path = "sugar_events_tests.rs"]
mod tests;
