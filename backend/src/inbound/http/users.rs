//! Users API handlers.
//!
//! ```text
//! GET  /api/v1/users/leaderboard?timeframe=daily|monthly
//! POST /api/v1/users
//! POST /api/v1/users/login {"username":"sugar_warrior"}
//! GET  /api/v1/users/{anonymousId}
//! PUT  /api/v1/users/{anonymousId}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Activity, AnonymousId, DEFAULT_AVATAR, DEFAULT_DAILY_LIMIT_GRAMS, DEFAULT_HEIGHT_CM,
    DEFAULT_WEIGHT_KG, Error, LeaderboardEntry, LeaderboardTimeframe, NewUserProfile,
    PhysicalAttributes, ProfileUpdate, UserProfile, UserValidationError, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, require};

/// Daily activity figures.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBody {
    #[schema(example = 4500)]
    pub steps: u32,
    #[schema(example = 7.0)]
    pub sleep_hours: f64,
}

impl From<&Activity> for ActivityBody {
    fn from(activity: &Activity) -> Self {
        Self {
            steps: activity.steps(),
            sleep_hours: activity.sleep_hours(),
        }
    }
}

/// Registration payload for `POST /api/v1/users`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserBody {
    #[schema(example = "k3j9x0a1b", required = true)]
    pub anonymous_id: Option<String>,
    #[schema(example = "sugar_warrior")]
    pub username: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    #[schema(example = 29, required = true)]
    pub age: Option<u16>,
    /// Centimetres; defaults to 170.
    pub height: Option<f64>,
    /// Kilograms; defaults to 70.
    pub weight: Option<f64>,
    /// Grams per day; defaults to 30.
    pub daily_limit: Option<f64>,
    pub avatar: Option<String>,
    pub onboarded: Option<bool>,
    pub activity: Option<ActivityBody>,
}

/// Editable profile attributes for `PUT /api/v1/users/{anonymousId}`.
///
/// Points, streak, and last log date are not accepted.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    pub username: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u16>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub daily_limit: Option<f64>,
    pub avatar: Option<String>,
    pub onboarded: Option<bool>,
    pub activity: Option<ActivityBody>,
}

/// Login request body for `POST /api/v1/users/login`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    #[schema(example = "sugar_warrior", required = true)]
    pub username: Option<String>,
}

/// Profile returned by every user endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub anonymous_id: String,
    pub username: Option<String>,
    pub name: String,
    pub gender: String,
    pub age: u16,
    pub height: f64,
    pub weight: f64,
    /// Derived from height and weight, one decimal place.
    #[schema(example = 24.2)]
    pub bmi: f64,
    pub daily_limit: f64,
    pub avatar: String,
    pub onboarded: bool,
    pub activity: ActivityBody,
    pub points: u64,
    pub current_streak: u32,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_log_date: Option<NaiveDate>,
}

impl From<UserProfile> for UserProfileBody {
    fn from(profile: UserProfile) -> Self {
        let attributes = profile.attributes();
        let streak = profile.streak();
        Self {
            id: profile.id().to_string(),
            anonymous_id: profile.anonymous_id().to_string(),
            username: profile.username().map(ToString::to_string),
            name: profile.name().to_owned(),
            gender: profile.gender().to_owned(),
            age: attributes.age(),
            height: attributes.height_cm(),
            weight: attributes.weight_kg(),
            bmi: profile.bmi(),
            daily_limit: profile.daily_limit_grams(),
            avatar: profile.avatar().to_owned(),
            onboarded: profile.onboarded(),
            activity: ActivityBody::from(profile.activity()),
            points: profile.points(),
            current_streak: streak.current,
            last_log_date: streak.last_log_date,
        }
    }
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub username: Option<String>,
    pub name: String,
    pub avatar: String,
    pub xp: u64,
}

impl From<LeaderboardEntry> for LeaderboardEntryBody {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            id: entry.user_id.to_string(),
            username: entry.username,
            name: entry.name,
            avatar: entry.avatar,
            xp: entry.xp,
        }
    }
}

/// Query string for the leaderboard.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LeaderboardParams {
    /// `daily` (default) or `monthly`; anything else means daily.
    pub timeframe: Option<String>,
}

fn field_for(err: &UserValidationError) -> FieldName {
    match err {
        UserValidationError::InvalidId => FieldName::new("id"),
        UserValidationError::EmptyAnonymousId | UserValidationError::AnonymousIdTooLong { .. } => {
            FieldName::new("anonymousId")
        }
        UserValidationError::UsernameTooShort { .. }
        | UserValidationError::UsernameTooLong { .. }
        | UserValidationError::UsernameInvalidCharacters => FieldName::new("username"),
        UserValidationError::AgeOutOfRange { .. } => FieldName::new("age"),
        UserValidationError::HeightOutOfRange => FieldName::new("height"),
        UserValidationError::WeightOutOfRange => FieldName::new("weight"),
        UserValidationError::DailyLimitOutOfRange => FieldName::new("dailyLimit"),
        UserValidationError::SleepHoursOutOfRange => FieldName::new("activity"),
    }
}

fn map_validation_error(err: UserValidationError) -> Error {
    invalid_field_error(field_for(&err), err)
}

fn parse_username(raw: Option<String>) -> Result<Option<Username>, Error> {
    raw.map(Username::new)
        .transpose()
        .map_err(map_validation_error)
}

fn parse_activity(raw: Option<ActivityBody>) -> Result<Option<Activity>, Error> {
    raw.map(|body| Activity::new(body.steps, body.sleep_hours))
        .transpose()
        .map_err(map_validation_error)
}

fn parse_anonymous_id(raw: String) -> Result<AnonymousId, Error> {
    AnonymousId::new(raw).map_err(map_validation_error)
}

fn parse_registration(body: RegisterUserBody) -> Result<NewUserProfile, Error> {
    let anonymous_id =
        parse_anonymous_id(require(body.anonymous_id, FieldName::new("anonymousId"))?)?;
    let age = require(body.age, FieldName::new("age"))?;
    let attributes = PhysicalAttributes::new(
        age,
        body.height.unwrap_or(DEFAULT_HEIGHT_CM),
        body.weight.unwrap_or(DEFAULT_WEIGHT_KG),
    )
    .map_err(map_validation_error)?;

    Ok(NewUserProfile {
        anonymous_id,
        username: parse_username(body.username)?,
        name: body.name.unwrap_or_default(),
        gender: body.gender.unwrap_or_default(),
        attributes,
        daily_limit_grams: body.daily_limit.unwrap_or(DEFAULT_DAILY_LIMIT_GRAMS),
        avatar: body.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_owned()),
        onboarded: body.onboarded.unwrap_or(false),
        activity: parse_activity(body.activity)?.unwrap_or_default(),
    })
}

fn parse_update(body: UpdateProfileBody) -> Result<ProfileUpdate, Error> {
    Ok(ProfileUpdate {
        username: parse_username(body.username)?,
        name: body.name,
        gender: body.gender,
        age: body.age,
        height_cm: body.height,
        weight_kg: body.weight,
        daily_limit_grams: body.daily_limit,
        avatar: body.avatar,
        onboarded: body.onboarded,
        activity: parse_activity(body.activity)?,
    })
}

/// Top ten users by points earned inside the window.
#[utoipa::path(
    get,
    path = "/api/v1/users/leaderboard",
    params(LeaderboardParams),
    responses(
        (status = 200, description = "Ranked entries, highest xp first", body = [LeaderboardEntryBody]),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Event store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "leaderboard"
)]
#[get("/users/leaderboard")]
pub async fn leaderboard(
    state: web::Data<HttpState>,
    params: web::Query<LeaderboardParams>,
) -> ApiResult<web::Json<Vec<LeaderboardEntryBody>>> {
    let timeframe = LeaderboardTimeframe::from_selector(params.timeframe.as_deref());
    let entries = state.leaderboard.leaderboard(timeframe).await?;
    Ok(web::Json(
        entries.into_iter().map(LeaderboardEntryBody::from).collect(),
    ))
}

/// Register a new profile.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterUserBody,
    responses(
        (status = 201, description = "Profile created", body = UserProfileBody),
        (status = 400, description = "Invalid request or username taken", body = Error),
        (status = 503, description = "Event store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "registerUser"
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterUserBody>,
) -> ApiResult<HttpResponse> {
    let new_profile = parse_registration(payload.into_inner())?;
    let profile = state.accounts.register(new_profile).await?;
    Ok(HttpResponse::Created().json(UserProfileBody::from(profile)))
}

/// Look a profile up by username.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Profile found", body = UserProfileBody),
        (status = 400, description = "Missing username", body = Error),
        (status = 404, description = "Unknown username", body = Error)
    ),
    tags = ["users"],
    operation_id = "login"
)]
#[post("/users/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginBody>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let username = require(payload.into_inner().username, FieldName::new("username"))?;
    // A name no account could hold is simply absent.
    let username = Username::new(username.as_str())
        .map_err(|_| Error::not_found(format!("user {username} not found")))?;
    let profile = state.accounts_query.login(&username).await?;
    Ok(web::Json(UserProfileBody::from(profile)))
}

/// Fetch a profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/{anonymousId}",
    params(("anonymousId" = String, Path, description = "Device-scoped anonymous identifier")),
    responses(
        (status = 200, description = "Profile", body = UserProfileBody),
        (status = 404, description = "Unknown profile", body = Error)
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/users/{anonymousId}")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let anonymous_id = parse_anonymous_id(path.into_inner())?;
    let profile = state.accounts_query.get_profile(&anonymous_id).await?;
    Ok(web::Json(UserProfileBody::from(profile)))
}

/// Edit user-controlled profile attributes.
#[utoipa::path(
    put,
    path = "/api/v1/users/{anonymousId}",
    params(("anonymousId" = String, Path, description = "Device-scoped anonymous identifier")),
    request_body = UpdateProfileBody,
    responses(
        (status = 200, description = "Updated profile", body = UserProfileBody),
        (status = 400, description = "Invalid request or username taken", body = Error),
        (status = 404, description = "Unknown profile", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/{anonymousId}")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateProfileBody>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let anonymous_id = parse_anonymous_id(path.into_inner())?;
    let update = parse_update(payload.into_inner())?;
    let profile = state
        .accounts
        .update_profile(&anonymous_id, update)
        .await?;
    Ok(web::Json(UserProfileBody::from(profile)))
}

#[cfg(test)]
mod tests;
