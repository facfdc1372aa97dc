//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{sugar_events, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub anonymous_id: String,
    pub username: Option<String>,
    pub name: String,
    pub gender: String,
    pub age: i16,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub daily_limit_grams: f64,
    pub avatar: String,
    pub onboarded: bool,
    pub steps: i32,
    pub sleep_hours: f64,
    pub points: i64,
    pub current_streak: i32,
    pub last_log_date: Option<NaiveDate>,
}

/// Insertable struct for registering a profile.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub anonymous_id: &'a str,
    pub username: Option<&'a str>,
    pub name: &'a str,
    pub gender: &'a str,
    pub age: i16,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub daily_limit_grams: f64,
    pub avatar: &'a str,
    pub onboarded: bool,
    pub steps: i32,
    pub sleep_hours: f64,
}

/// Changeset for user-editable profile attributes.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserAttributesUpdate<'a> {
    pub username: Option<&'a str>,
    pub name: &'a str,
    pub gender: &'a str,
    pub age: i16,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub daily_limit_grams: f64,
    pub avatar: &'a str,
    pub onboarded: bool,
    pub steps: i32,
    pub sleep_hours: f64,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the sugar_events table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sugar_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SugarEventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub item_name: String,
    pub sugar_grams: f64,
    pub calories: Option<f64>,
    pub category: Option<String>,
    pub method: String,
    pub corrective_action_completed: bool,
    pub points_earned: Option<i32>,
    pub is_recommendation: bool,
}

/// Insertable struct for a freshly logged, unscored event.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sugar_events)]
pub(crate) struct NewSugarEventRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub item_name: &'a str,
    pub sugar_grams: f64,
    pub calories: Option<f64>,
    pub category: Option<&'a str>,
    pub method: &'a str,
    pub corrective_action_completed: bool,
    pub points_earned: Option<i32>,
    pub is_recommendation: bool,
}
