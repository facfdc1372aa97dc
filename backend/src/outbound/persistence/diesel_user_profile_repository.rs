//! PostgreSQL-backed `UserProfileRepository` implementation using Diesel ORM.
//!
//! Engagement updates are a single `UPDATE .. SET points = points + $1`
//! statement, so concurrent writers never lose points.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserProfileRepository, UserProfileRepositoryError};
use crate::domain::{
    Activity, AnonymousId, PhysicalAttributes, StreakState, UserId, UserProfile,
    UserProfileRecord, Username,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation_constraint,
};
use super::models::{NewUserRow, UserAttributesUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const ANONYMOUS_ID_CONSTRAINT: &str = "users_anonymous_id_key";

/// Diesel-backed implementation of the profile repository port.
#[derive(Clone)]
pub struct DieselUserProfileRepository {
    pool: DbPool,
}

impl DieselUserProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserProfileRepositoryError {
    map_basic_pool_error(error, UserProfileRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserProfileRepositoryError {
    map_basic_diesel_error(
        error,
        UserProfileRepositoryError::query,
        UserProfileRepositoryError::connection,
    )
}

fn map_write_error(
    error: diesel::result::Error,
    profile: &UserProfile,
) -> UserProfileRepositoryError {
    match unique_violation_constraint(&error) {
        Some(USERNAME_CONSTRAINT) => UserProfileRepositoryError::duplicate_username(
            profile
                .username()
                .map(ToString::to_string)
                .unwrap_or_default(),
        ),
        Some(ANONYMOUS_ID_CONSTRAINT) => {
            UserProfileRepositoryError::duplicate_anonymous_id(profile.anonymous_id().to_string())
        }
        _ => map_diesel_error(error),
    }
}

fn decode_error(field: &str, err: impl std::fmt::Display) -> UserProfileRepositoryError {
    UserProfileRepositoryError::query(format!("decode users.{field}: {err}"))
}

/// Convert a database row into a validated domain profile.
fn row_to_profile(row: UserRow) -> Result<UserProfile, UserProfileRepositoryError> {
    let age = u16::try_from(row.age).map_err(|err| decode_error("age", err))?;
    let attributes = PhysicalAttributes::new(age, row.height_cm, row.weight_kg)
        .map_err(|err| decode_error("attributes", err))?;
    let steps = u32::try_from(row.steps).map_err(|err| decode_error("steps", err))?;
    let activity =
        Activity::new(steps, row.sleep_hours).map_err(|err| decode_error("sleep_hours", err))?;
    let username = row
        .username
        .map(Username::new)
        .transpose()
        .map_err(|err| decode_error("username", err))?;
    let points = u64::try_from(row.points).map_err(|err| decode_error("points", err))?;
    let current =
        u32::try_from(row.current_streak).map_err(|err| decode_error("current_streak", err))?;

    Ok(UserProfile::restore(UserProfileRecord {
        id: UserId::from_uuid(row.id),
        anonymous_id: AnonymousId::new(row.anonymous_id)
            .map_err(|err| decode_error("anonymous_id", err))?,
        username,
        name: row.name,
        gender: row.gender,
        attributes,
        daily_limit_grams: row.daily_limit_grams,
        avatar: row.avatar,
        onboarded: row.onboarded,
        activity,
        points,
        streak: StreakState {
            current,
            last_log_date: row.last_log_date,
        },
    }))
}

fn to_i16(value: u16) -> Result<i16, UserProfileRepositoryError> {
    i16::try_from(value).map_err(|err| UserProfileRepositoryError::query(format!("age: {err}")))
}

fn to_i32(value: u32, field: &str) -> Result<i32, UserProfileRepositoryError> {
    i32::try_from(value)
        .map_err(|err| UserProfileRepositoryError::query(format!("{field}: {err}")))
}

#[async_trait]
impl UserProfileRepository for DieselUserProfileRepository {
    async fn create(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let attributes = profile.attributes();
        let row = NewUserRow {
            id: *profile.id().as_uuid(),
            anonymous_id: profile.anonymous_id().as_ref(),
            username: profile.username().map(AsRef::as_ref),
            name: profile.name(),
            gender: profile.gender(),
            age: to_i16(attributes.age())?,
            height_cm: attributes.height_cm(),
            weight_kg: attributes.weight_kg(),
            daily_limit_grams: profile.daily_limit_grams(),
            avatar: profile.avatar(),
            onboarded: profile.onboarded(),
            steps: to_i32(profile.activity().steps(), "steps")?,
            sleep_hours: profile.activity().sleep_hours(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, profile))
    }

    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_profile).transpose()
    }

    async fn find_by_anonymous_id(
        &self,
        anonymous_id: &AnonymousId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::anonymous_id.eq(anonymous_id.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_profile).transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_profile).transpose()
    }

    async fn find_many(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserProfile>, UserProfileRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(&uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_profile).collect()
    }

    async fn update_attributes(
        &self,
        profile: &UserProfile,
    ) -> Result<(), UserProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let attributes = profile.attributes();
        let changes = UserAttributesUpdate {
            username: profile.username().map(AsRef::as_ref),
            name: profile.name(),
            gender: profile.gender(),
            age: to_i16(attributes.age())?,
            height_cm: attributes.height_cm(),
            weight_kg: attributes.weight_kg(),
            daily_limit_grams: profile.daily_limit_grams(),
            avatar: profile.avatar(),
            onboarded: profile.onboarded(),
            steps: to_i32(profile.activity().steps(), "steps")?,
            sleep_hours: profile.activity().sleep_hours(),
            updated_at: Utc::now(),
        };

        diesel::update(users::table.filter(users::id.eq(profile.id().as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, profile))
    }

    async fn apply_engagement(
        &self,
        id: &UserId,
        points_delta: u32,
        streak: StreakState,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let current_streak = to_i32(streak.current, "current_streak")?;

        let row = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::points.eq(users::points + i64::from(points_delta)),
                users::current_streak.eq(current_streak),
                users::last_log_date.eq(streak.last_log_date),
                users::updated_at.eq(Utc::now()),
            ))
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_profile).transpose()
    }
}
