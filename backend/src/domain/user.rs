//! User profile model.
//!
//! A profile carries the user's identity, the physical attributes they edit
//! themselves, and the engagement totals (points and streak) that only the
//! engagement service mutates.

use std::fmt;

use uuid::Uuid;

use super::gamification::StreakState;

/// Validation errors raised while building or editing a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum UserValidationError {
    InvalidId,
    EmptyAnonymousId,
    AnonymousIdTooLong { max: usize },
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    AgeOutOfRange { min: u16, max: u16 },
    HeightOutOfRange,
    WeightOutOfRange,
    DailyLimitOutOfRange,
    SleepHoursOutOfRange,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyAnonymousId => write!(f, "anonymous id must not be empty"),
            Self::AnonymousIdTooLong { max } => {
                write!(f, "anonymous id must be at most {max} characters")
            }
            Self::UsernameTooShort { min } => {
                write!(f, "username must be at least {min} characters")
            }
            Self::UsernameTooLong { max } => write!(f, "username must be at most {max} characters"),
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, or underscores"
            ),
            Self::AgeOutOfRange { min, max } => write!(f, "age must be between {min} and {max}"),
            Self::HeightOutOfRange => write!(f, "height must be between 1 and 300 centimetres"),
            Self::WeightOutOfRange => write!(f, "weight must be between 1 and 700 kilograms"),
            Self::DailyLimitOutOfRange => {
                write!(f, "daily limit must be a positive number of grams")
            }
            Self::SleepHoursOutOfRange => write!(f, "sleep hours must be between 0 and 24"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable internal user identifier; events reference users by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its textual UUID form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Maximum length of a client-generated anonymous id.
pub const ANONYMOUS_ID_MAX: usize = 64;

/// Client-generated anonymous handle used to fetch and edit a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousId(String);

impl AnonymousId {
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyAnonymousId);
        }
        if trimmed.chars().count() > ANONYMOUS_ID_MAX {
            return Err(UserValidationError::AnonymousIdTooLong {
                max: ANONYMOUS_ID_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for AnonymousId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AnonymousId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;

/// Unique public username shown on the leaderboard and used to log in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Daily activity figures reported by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activity {
    steps: u32,
    sleep_hours: f64,
}

impl Default for Activity {
    fn default() -> Self {
        Self {
            steps: 4_500,
            sleep_hours: 7.0,
        }
    }
}

impl Activity {
    pub fn new(steps: u32, sleep_hours: f64) -> Result<Self, UserValidationError> {
        if !sleep_hours.is_finite() || !(0.0..=24.0).contains(&sleep_hours) {
            return Err(UserValidationError::SleepHoursOutOfRange);
        }
        Ok(Self { steps, sleep_hours })
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn sleep_hours(&self) -> f64 {
        self.sleep_hours
    }
}

/// Youngest accepted age.
pub const AGE_MIN: u16 = 1;
/// Oldest accepted age.
pub const AGE_MAX: u16 = 130;
/// Height assumed when registration omits it.
pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
/// Weight assumed when registration omits it.
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
/// Daily sugar allowance assumed when registration omits it.
pub const DEFAULT_DAILY_LIMIT_GRAMS: f64 = 30.0;
/// Avatar assumed when registration omits it.
pub const DEFAULT_AVATAR: &str = "👤";

/// Age, height, and weight; BMI is always derived, never stored by callers.
///
/// # Examples
/// ```
/// use sugar_spike::domain::PhysicalAttributes;
///
/// let attributes = PhysicalAttributes::new(22, 170.0, 70.0).expect("valid");
/// assert_eq!(attributes.bmi(), 24.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalAttributes {
    age: u16,
    height_cm: f64,
    weight_kg: f64,
}

impl PhysicalAttributes {
    pub fn new(age: u16, height_cm: f64, weight_kg: f64) -> Result<Self, UserValidationError> {
        if !(AGE_MIN..=AGE_MAX).contains(&age) {
            return Err(UserValidationError::AgeOutOfRange {
                min: AGE_MIN,
                max: AGE_MAX,
            });
        }
        if !height_cm.is_finite() || !(1.0..=300.0).contains(&height_cm) {
            return Err(UserValidationError::HeightOutOfRange);
        }
        if !weight_kg.is_finite() || !(1.0..=700.0).contains(&weight_kg) {
            return Err(UserValidationError::WeightOutOfRange);
        }
        Ok(Self {
            age,
            height_cm,
            weight_kg,
        })
    }

    pub fn age(&self) -> u16 {
        self.age
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    /// Body-mass index rounded to one decimal place.
    pub fn bmi(&self) -> f64 {
        let metres = self.height_cm / 100.0;
        let raw = self.weight_kg / (metres * metres);
        (raw * 10.0).round() / 10.0
    }
}

fn validate_daily_limit(grams: f64) -> Result<f64, UserValidationError> {
    if grams.is_finite() && grams > 0.0 {
        Ok(grams)
    } else {
        Err(UserValidationError::DailyLimitOutOfRange)
    }
}

/// Registration input after transport-level parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserProfile {
    pub anonymous_id: AnonymousId,
    pub username: Option<Username>,
    pub name: String,
    pub gender: String,
    pub attributes: PhysicalAttributes,
    pub daily_limit_grams: f64,
    pub avatar: String,
    pub onboarded: bool,
    pub activity: Activity,
}

/// User-editable subset of a profile. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<Username>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u16>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub daily_limit_grams: Option<f64>,
    pub avatar: Option<String>,
    pub onboarded: Option<bool>,
    pub activity: Option<Activity>,
}

/// Flat persisted form of a profile, used by adapters to restore one.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfileRecord {
    pub id: UserId,
    pub anonymous_id: AnonymousId,
    pub username: Option<Username>,
    pub name: String,
    pub gender: String,
    pub attributes: PhysicalAttributes,
    pub daily_limit_grams: f64,
    pub avatar: String,
    pub onboarded: bool,
    pub activity: Activity,
    pub points: u64,
    pub streak: StreakState,
}

/// Application user profile.
///
/// ## Invariants
/// - `points` never decreases.
/// - `points` and `streak` change only through [`UserProfile::apply_engagement`].
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    record: UserProfileRecord,
}

impl UserProfile {
    /// Profile for a newly registered user: zero points, no streak.
    pub fn register(id: UserId, new: NewUserProfile) -> Result<Self, UserValidationError> {
        let NewUserProfile {
            anonymous_id,
            username,
            name,
            gender,
            attributes,
            daily_limit_grams,
            avatar,
            onboarded,
            activity,
        } = new;
        Ok(Self {
            record: UserProfileRecord {
                id,
                anonymous_id,
                username,
                name,
                gender,
                attributes,
                daily_limit_grams: validate_daily_limit(daily_limit_grams)?,
                avatar,
                onboarded,
                activity,
                points: 0,
                streak: StreakState::default(),
            },
        })
    }

    /// Rebuild a profile from its stored form.
    pub fn restore(record: UserProfileRecord) -> Self {
        Self { record }
    }

    pub fn id(&self) -> UserId {
        self.record.id
    }

    pub fn anonymous_id(&self) -> &AnonymousId {
        &self.record.anonymous_id
    }

    pub fn username(&self) -> Option<&Username> {
        self.record.username.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn gender(&self) -> &str {
        &self.record.gender
    }

    pub fn attributes(&self) -> &PhysicalAttributes {
        &self.record.attributes
    }

    pub fn bmi(&self) -> f64 {
        self.record.attributes.bmi()
    }

    pub fn daily_limit_grams(&self) -> f64 {
        self.record.daily_limit_grams
    }

    pub fn avatar(&self) -> &str {
        &self.record.avatar
    }

    pub fn onboarded(&self) -> bool {
        self.record.onboarded
    }

    pub fn activity(&self) -> &Activity {
        &self.record.activity
    }

    pub fn points(&self) -> u64 {
        self.record.points
    }

    pub fn streak(&self) -> StreakState {
        self.record.streak
    }

    pub fn record(&self) -> &UserProfileRecord {
        &self.record
    }

    /// Apply a user edit, re-validating physical attributes as a whole.
    pub fn apply_update(&mut self, update: ProfileUpdate) -> Result<(), UserValidationError> {
        let current = self.record.attributes;
        let attributes = PhysicalAttributes::new(
            update.age.unwrap_or(current.age()),
            update.height_cm.unwrap_or(current.height_cm()),
            update.weight_kg.unwrap_or(current.weight_kg()),
        )?;
        let daily_limit_grams = match update.daily_limit_grams {
            Some(grams) => validate_daily_limit(grams)?,
            None => self.record.daily_limit_grams,
        };

        self.record.attributes = attributes;
        self.record.daily_limit_grams = daily_limit_grams;
        if let Some(username) = update.username {
            self.record.username = Some(username);
        }
        if let Some(name) = update.name {
            self.record.name = name;
        }
        if let Some(gender) = update.gender {
            self.record.gender = gender;
        }
        if let Some(avatar) = update.avatar {
            self.record.avatar = avatar;
        }
        if let Some(onboarded) = update.onboarded {
            self.record.onboarded = onboarded;
        }
        if let Some(activity) = update.activity {
            self.record.activity = activity;
        }
        Ok(())
    }

    /// Add awarded points and install the streak produced by the tracker.
    pub fn apply_engagement(&mut self, points_delta: u32, streak: StreakState) {
        self.record.points = self.record.points.saturating_add(u64::from(points_delta));
        self.record.streak = streak;
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn new_profile() -> NewUserProfile {
        NewUserProfile {
            anonymous_id: AnonymousId::new("k3j9x0a1b").expect("anonymous id"),
            username: Some(Username::new("sugar_warrior").expect("username")),
            name: "Ada".to_owned(),
            gender: String::new(),
            attributes: PhysicalAttributes::new(22, DEFAULT_HEIGHT_CM, DEFAULT_WEIGHT_KG)
                .expect("attributes"),
            daily_limit_grams: DEFAULT_DAILY_LIMIT_GRAMS,
            avatar: DEFAULT_AVATAR.to_owned(),
            onboarded: true,
            activity: Activity::default(),
        }
    }

    #[rstest]
    #[case("ab", UserValidationError::UsernameTooShort { min: USERNAME_MIN })]
    #[case("has space", UserValidationError::UsernameInvalidCharacters)]
    #[case("a".repeat(USERNAME_MAX + 1), UserValidationError::UsernameTooLong { max: USERNAME_MAX })]
    fn username_rejects_invalid_input(
        #[case] raw: String,
        #[case] expected: UserValidationError,
    ) {
        assert_eq!(Username::new(raw), Err(expected));
    }

    #[rstest]
    fn anonymous_id_is_trimmed() {
        let id = AnonymousId::new("  abc  ").expect("valid");
        assert_eq!(id.as_ref(), "abc");
        assert_eq!(
            AnonymousId::new("   "),
            Err(UserValidationError::EmptyAnonymousId)
        );
    }

    #[rstest]
    fn user_id_rejects_padding() {
        let raw = format!(" {}", Uuid::nil());
        assert_eq!(UserId::new(raw), Err(UserValidationError::InvalidId));
    }

    #[rstest]
    #[case(0, 170.0, 70.0)]
    #[case(30, 0.0, 70.0)]
    #[case(30, 170.0, f64::NAN)]
    fn attributes_reject_out_of_range(#[case] age: u16, #[case] height: f64, #[case] weight: f64) {
        assert!(PhysicalAttributes::new(age, height, weight).is_err());
    }

    #[rstest]
    fn registration_starts_with_zero_engagement(new_profile: NewUserProfile) {
        let profile = UserProfile::register(UserId::random(), new_profile).expect("profile");
        assert_eq!(profile.points(), 0);
        assert_eq!(profile.streak(), StreakState::default());
        assert_eq!(profile.bmi(), 24.2);
    }

    #[rstest]
    fn update_recomputes_bmi(new_profile: NewUserProfile) {
        let mut profile = UserProfile::register(UserId::random(), new_profile).expect("profile");
        profile
            .apply_update(ProfileUpdate {
                weight_kg: Some(80.0),
                height_cm: Some(180.0),
                ..ProfileUpdate::default()
            })
            .expect("update");
        assert_eq!(profile.bmi(), 24.7);
        assert_eq!(profile.attributes().age(), 22);
    }

    #[rstest]
    fn invalid_update_leaves_profile_untouched(new_profile: NewUserProfile) {
        let mut profile = UserProfile::register(UserId::random(), new_profile).expect("profile");
        let before = profile.clone();
        let result = profile.apply_update(ProfileUpdate {
            name: Some("Changed".to_owned()),
            daily_limit_grams: Some(-3.0),
            ..ProfileUpdate::default()
        });
        assert_eq!(result, Err(UserValidationError::DailyLimitOutOfRange));
        assert_eq!(profile, before);
    }

    #[rstest]
    fn engagement_accumulates_points(new_profile: NewUserProfile) {
        let mut profile = UserProfile::register(UserId::random(), new_profile).expect("profile");
        let streak = StreakState::default();
        profile.apply_engagement(13, streak);
        profile.apply_engagement(5, streak);
        assert_eq!(profile.points(), 18);
    }
}
