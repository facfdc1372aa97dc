//! User-local calendar arithmetic.
//!
//! Streaks, the first check-in of the day, the early logging cut-off, and the
//! leaderboard windows all depend on local calendar boundaries. The service
//! runs with one configured UTC offset.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc,
};

/// Largest offset accepted, in minutes (UTC±18:00).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Validation errors for [`LocalCalendar::from_offset_minutes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("utc offset must be within ±{max} minutes, got {minutes}")]
    OffsetOutOfRange { minutes: i32, max: i32 },
}

/// Calendar bound to a fixed UTC offset.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use sugar_spike::domain::LocalCalendar;
///
/// let calendar = LocalCalendar::from_offset_minutes(120).expect("valid offset");
/// let instant = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
/// assert_eq!(calendar.local_date(instant), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
/// assert_eq!(calendar.local_hour(instant), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl LocalCalendar {
    /// Calendar on UTC.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Build a calendar from an offset east of UTC in minutes.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, CalendarError> {
        let out_of_range = CalendarError::OffsetOutOfRange {
            minutes,
            max: MAX_UTC_OFFSET_MINUTES,
        };
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(out_of_range);
        }
        let offset = FixedOffset::east_opt(minutes * 60).ok_or(out_of_range)?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of an instant, time discarded.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Local hour of day (0-23) of an instant.
    pub fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.offset).hour()
    }

    /// Instant of local midnight on `date`.
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        (local - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// Local midnight of the day containing `instant`.
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.local_date(instant))
    }

    /// Local midnight on the first of the month containing `instant`.
    pub fn start_of_month(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(instant);
        self.midnight(date - Duration::days(i64::from(date.day0())))
    }
}
