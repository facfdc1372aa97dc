//! PostgreSQL-backed `SugarEventRepository` implementation using Diesel ORM.
//!
//! Points are written with `WHERE points_earned IS NULL`, so an event is
//! scored at most once even when a repair pass races a live request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{max, sum};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{SugarEventRepository, SugarEventRepositoryError};
use crate::domain::{
    InputMethod, SugarEvent, SugarEventDraft, SugarEventId, SugarGrams, UserId, UserPointsTotal,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewSugarEventRow, SugarEventRow};
use super::pool::{DbPool, PoolError};
use super::schema::sugar_events;

/// Diesel-backed implementation of the sugar event repository port.
#[derive(Clone)]
pub struct DieselSugarEventRepository {
    pool: DbPool,
}

impl DieselSugarEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SugarEventRepositoryError {
    map_basic_pool_error(error, SugarEventRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SugarEventRepositoryError {
    map_basic_diesel_error(
        error,
        SugarEventRepositoryError::query,
        SugarEventRepositoryError::connection,
    )
}

fn decode_error(field: &str, err: impl std::fmt::Display) -> SugarEventRepositoryError {
    SugarEventRepositoryError::query(format!("decode sugar_events.{field}: {err}"))
}

/// Convert a database row into a validated domain event.
fn row_to_event(row: SugarEventRow) -> Result<SugarEvent, SugarEventRepositoryError> {
    let SugarEventRow {
        id,
        user_id,
        occurred_at,
        item_name,
        sugar_grams,
        calories,
        category,
        method,
        corrective_action_completed,
        points_earned,
        is_recommendation,
    } = row;

    let points_earned = points_earned
        .map(u32::try_from)
        .transpose()
        .map_err(|err| decode_error("points_earned", err))?;
    let draft = SugarEventDraft {
        user_id: UserId::from_uuid(user_id),
        timestamp: occurred_at,
        item_name,
        sugar_grams: SugarGrams::new(sugar_grams)
            .map_err(|err| decode_error("sugar_grams", err))?,
        calories,
        category,
        method: method
            .parse::<InputMethod>()
            .map_err(|err| decode_error("method", err))?,
        is_recommendation,
    };
    SugarEvent::from_parts(
        SugarEventId::from_uuid(id),
        draft,
        corrective_action_completed,
        points_earned,
    )
    .map_err(|err| SugarEventRepositoryError::query(err.to_string()))
}

fn to_points_total(
    (user_id, points, last_event_at): (Uuid, Option<i64>, Option<DateTime<Utc>>),
) -> Result<Option<UserPointsTotal>, SugarEventRepositoryError> {
    let Some(last_event_at) = last_event_at else {
        return Ok(None);
    };
    let points = u64::try_from(points.unwrap_or(0)).map_err(|err| decode_error("sum", err))?;
    Ok(Some(UserPointsTotal {
        user_id: UserId::from_uuid(user_id),
        points,
        last_event_at,
    }))
}

#[async_trait]
impl SugarEventRepository for DieselSugarEventRepository {
    async fn insert(&self, event: &SugarEvent) -> Result<(), SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let points_earned = event
            .points_earned()
            .map(i32::try_from)
            .transpose()
            .map_err(|err| SugarEventRepositoryError::query(format!("points_earned: {err}")))?;
        let row = NewSugarEventRow {
            id: *event.id().as_uuid(),
            user_id: *event.user_id().as_uuid(),
            occurred_at: event.timestamp(),
            item_name: event.item_name(),
            sugar_grams: event.sugar_grams().value(),
            calories: event.calories(),
            category: event.category(),
            method: event.method().as_str(),
            corrective_action_completed: event.corrective_action_completed(),
            points_earned,
            is_recommendation: event.is_recommendation(),
        };

        diesel::insert_into(sugar_events::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = sugar_events::table
            .filter(sugar_events::id.eq(id.as_uuid()))
            .select(SugarEventRow::as_select())
            .first::<SugarEventRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_event).transpose()
    }

    async fn count_for_user_between(
        &self,
        user_id: &UserId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = sugar_events::table
            .filter(
                sugar_events::user_id
                    .eq(user_id.as_uuid())
                    .and(sugar_events::occurred_at.ge(from))
                    .and(sugar_events::occurred_at.lt(until)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(count).map_err(|err| decode_error("count", err))
    }

    async fn latest_before(
        &self,
        user_id: &UserId,
        before: DateTime<Utc>,
        exclude: &SugarEventId,
    ) -> Result<Option<SugarEvent>, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = sugar_events::table
            .filter(
                sugar_events::user_id
                    .eq(user_id.as_uuid())
                    .and(sugar_events::occurred_at.lt(before))
                    .and(sugar_events::id.ne(exclude.as_uuid())),
            )
            .order((sugar_events::occurred_at.desc(), sugar_events::id.desc()))
            .select(SugarEventRow::as_select())
            .first::<SugarEventRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_event).transpose()
    }

    async fn record_points(
        &self,
        id: &SugarEventId,
        points: u32,
    ) -> Result<bool, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let points = i32::try_from(points)
            .map_err(|err| SugarEventRepositoryError::query(format!("points_earned: {err}")))?;
        let updated = diesel::update(
            sugar_events::table.filter(
                sugar_events::id
                    .eq(id.as_uuid())
                    .and(sugar_events::points_earned.is_null()),
            ),
        )
        .set(sugar_events::points_earned.eq(Some(points)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn mark_corrective_action(
        &self,
        id: &SugarEventId,
    ) -> Result<bool, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(sugar_events::table.filter(sugar_events::id.eq(id.as_uuid())))
            .set(sugar_events::corrective_action_completed.eq(true))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SugarEventRow> = sugar_events::table
            .filter(sugar_events::user_id.eq(user_id.as_uuid()))
            .order((sugar_events::occurred_at.desc(), sugar_events::id.desc()))
            .select(SugarEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_event).collect()
    }

    async fn points_by_user_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserPointsTotal>, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, Option<i64>, Option<DateTime<Utc>>)> = sugar_events::table
            .filter(sugar_events::occurred_at.ge(since))
            .group_by(sugar_events::user_id)
            .select((
                sugar_events::user_id,
                sum(sugar_events::points_earned),
                max(sugar_events::occurred_at),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .filter_map(|row| to_points_total(row).transpose())
            .collect()
    }

    async fn list_unscored(
        &self,
        limit: usize,
    ) -> Result<Vec<SugarEvent>, SugarEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<SugarEventRow> = sugar_events::table
            .filter(sugar_events::points_earned.is_null())
            .order((sugar_events::occurred_at.asc(), sugar_events::id.asc()))
            .limit(limit)
            .select(SugarEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_event).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion edge cases; query coverage needs a live database.

    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn valid_row() -> SugarEventRow {
        SugarEventRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            item_name: "Soda".to_owned(),
            sugar_grams: 39.0,
            calories: Some(140.0),
            category: Some("drink".to_owned()),
            method: "Auto-Log".to_owned(),
            corrective_action_completed: true,
            points_earned: Some(3),
            is_recommendation: false,
        }
    }

    #[rstest]
    fn valid_row_round_trips_flags(valid_row: SugarEventRow) {
        let event = row_to_event(valid_row).expect("valid row");
        assert_eq!(event.method(), InputMethod::AutoLog);
        assert!(event.corrective_action_completed());
        assert_eq!(event.points_earned(), Some(3));
    }

    #[rstest]
    fn unscored_row_has_no_points(mut valid_row: SugarEventRow) {
        valid_row.points_earned = None;
        let event = row_to_event(valid_row).expect("valid row");
        assert!(!event.is_scored());
    }

    #[rstest]
    #[case::unknown_method(|row: &mut SugarEventRow| row.method = "Telepathy".to_owned())]
    #[case::negative_grams(|row: &mut SugarEventRow| row.sugar_grams = -2.0)]
    #[case::negative_points(|row: &mut SugarEventRow| row.points_earned = Some(-1))]
    fn corrupt_rows_are_query_errors(
        mut valid_row: SugarEventRow,
        #[case] corrupt: fn(&mut SugarEventRow),
    ) {
        corrupt(&mut valid_row);
        let err = row_to_event(valid_row).expect_err("corrupt row");
        assert!(matches!(err, SugarEventRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unscored_only_groups_sum_to_zero() {
        let user = Uuid::new_v4();
        let total = to_points_total((user, None, Some(Utc::now())))
            .expect("valid")
            .expect("group present");
        assert_eq!(total.points, 0);
    }
}
