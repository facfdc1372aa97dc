//! Domain primitives, the gamification engine, and the services that drive it.
//!
//! Purpose: keep engagement rules transport and storage agnostic. Adapters
//! reach the domain only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: error payload shared by every driving port.
//! - UserProfile and its value types: identity, attributes, engagement.
//! - SugarEvent: a logged intake or activity.
//! - gamification: points rules, corrective links, streaks, leaderboards.
//! - EngagementService / UserAccountService: driving port implementations.

pub mod calendar;
pub mod engagement_service;
pub mod error;
pub mod gamification;
pub mod ports;
pub mod store_deadline;
pub mod sugar_event;
pub mod trace_id;
pub mod user;
pub mod user_locks;
pub mod user_service;

pub use self::calendar::{CalendarError, LocalCalendar, MAX_UTC_OFFSET_MINUTES};
pub use self::engagement_service::EngagementService;
pub use self::error::{Error, ErrorCode};
pub use self::gamification::{
    CorrectiveActionLinker, LEADERBOARD_LIMIT, LeaderboardAggregator, LeaderboardEntry,
    LeaderboardTimeframe, PointsAward, PointsCalculator, PointsContext, PointsReason,
    StreakState, StreakTracker, StreakTransition, UserPointsTotal,
};
pub use self::store_deadline::{DEFAULT_STORE_TIMEOUT, StoreDeadline};
pub use self::sugar_event::{
    InputMethod, SugarEvent, SugarEventDraft, SugarEventId, SugarEventValidationError,
    SugarGrams,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Activity, AnonymousId, DEFAULT_AVATAR, DEFAULT_DAILY_LIMIT_GRAMS, DEFAULT_HEIGHT_CM,
    DEFAULT_WEIGHT_KG, NewUserProfile, PhysicalAttributes, ProfileUpdate, UserId, UserProfile,
    UserProfileRecord, UserValidationError, Username,
};
pub use self::user_locks::UserLocks;
pub use self::user_service::UserAccountService;
