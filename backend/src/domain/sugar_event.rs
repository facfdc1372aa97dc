//! Sugar intake events.
//!
//! An event is created pending (no points), scored exactly once, and
//! afterwards only its corrective-action flag may flip from false to true.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Category value that marks an event as physical activity.
pub const EXERCISE_CATEGORY: &str = "exercise";
/// Label fragment that marks an event as physical activity.
pub const WALK_LABEL_FRAGMENT: &str = "walk";
/// Maximum length of an item label.
pub const ITEM_NAME_MAX: usize = 200;

/// Validation errors for event construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SugarEventValidationError {
    #[error("food name must not be empty")]
    EmptyItemName,
    #[error("food name must be at most {max} characters")]
    ItemNameTooLong { max: usize },
    #[error("sugar grams must be a non-negative number")]
    InvalidSugarGrams,
    #[error("calories must be a non-negative number")]
    InvalidCalories,
    #[error("unknown input method: {0}")]
    UnknownMethod(String),
}

/// Stable event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SugarEventId(Uuid);

impl SugarEventId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SugarEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How the user captured the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum InputMethod {
    Voice,
    Image,
    Manual,
    #[serde(rename = "Auto-Log")]
    #[schema(rename = "Auto-Log")]
    AutoLog,
}

impl InputMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "Voice",
            Self::Image => "Image",
            Self::Manual => "Manual",
            Self::AutoLog => "Auto-Log",
        }
    }
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMethod {
    type Err = SugarEventValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Voice" => Ok(Self::Voice),
            "Image" => Ok(Self::Image),
            "Manual" => Ok(Self::Manual),
            "Auto-Log" => Ok(Self::AutoLog),
            other => Err(SugarEventValidationError::UnknownMethod(other.to_owned())),
        }
    }
}

/// Non-negative, finite grams of sugar.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SugarGrams(f64);

impl SugarGrams {
    pub fn new(grams: f64) -> Result<Self, SugarEventValidationError> {
        if grams.is_finite() && grams >= 0.0 {
            Ok(Self(grams))
        } else {
            Err(SugarEventValidationError::InvalidSugarGrams)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Event attributes supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SugarEventDraft {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub item_name: String,
    pub sugar_grams: SugarGrams,
    pub calories: Option<f64>,
    pub category: Option<String>,
    pub method: InputMethod,
    pub is_recommendation: bool,
}

/// A logged intake or activity event.
#[derive(Debug, Clone, PartialEq)]
pub struct SugarEvent {
    id: SugarEventId,
    draft: SugarEventDraft,
    corrective_action_completed: bool,
    points_earned: Option<u32>,
}

impl SugarEvent {
    /// Validate a draft and build an unscored event.
    pub fn pending(
        id: SugarEventId,
        draft: SugarEventDraft,
    ) -> Result<Self, SugarEventValidationError> {
        Self::from_parts(id, draft, false, None)
    }

    /// Rebuild a stored event.
    pub fn from_parts(
        id: SugarEventId,
        mut draft: SugarEventDraft,
        corrective_action_completed: bool,
        points_earned: Option<u32>,
    ) -> Result<Self, SugarEventValidationError> {
        let trimmed = draft.item_name.trim();
        if trimmed.is_empty() {
            return Err(SugarEventValidationError::EmptyItemName);
        }
        if trimmed.chars().count() > ITEM_NAME_MAX {
            return Err(SugarEventValidationError::ItemNameTooLong { max: ITEM_NAME_MAX });
        }
        if draft
            .calories
            .is_some_and(|calories| !calories.is_finite() || calories < 0.0)
        {
            return Err(SugarEventValidationError::InvalidCalories);
        }
        draft.item_name = trimmed.to_owned();
        draft.category = draft
            .category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty());
        Ok(Self {
            id,
            draft,
            corrective_action_completed,
            points_earned,
        })
    }

    pub fn id(&self) -> SugarEventId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.draft.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.draft.timestamp
    }

    pub fn item_name(&self) -> &str {
        &self.draft.item_name
    }

    pub fn sugar_grams(&self) -> SugarGrams {
        self.draft.sugar_grams
    }

    pub fn calories(&self) -> Option<f64> {
        self.draft.calories
    }

    pub fn category(&self) -> Option<&str> {
        self.draft.category.as_deref()
    }

    pub fn method(&self) -> InputMethod {
        self.draft.method
    }

    pub fn is_recommendation(&self) -> bool {
        self.draft.is_recommendation
    }

    pub fn corrective_action_completed(&self) -> bool {
        self.corrective_action_completed
    }

    /// Points awarded, or `None` while the event is still unscored.
    pub fn points_earned(&self) -> Option<u32> {
        self.points_earned
    }

    pub fn is_scored(&self) -> bool {
        self.points_earned.is_some()
    }

    /// Exercise events: category `exercise` or a label mentioning a walk.
    pub fn is_exercise(&self) -> bool {
        let by_category = self
            .category()
            .is_some_and(|category| category.eq_ignore_ascii_case(EXERCISE_CATEGORY));
        by_category
            || self
                .item_name()
                .to_lowercase()
                .contains(WALK_LABEL_FRAGMENT)
    }

    /// Record the award. A scored event keeps its original points.
    pub fn score(&mut self, points: u32) -> bool {
        if self.points_earned.is_some() {
            return false;
        }
        self.points_earned = Some(points);
        true
    }

    /// Flag the event as neutralised by a later activity. Idempotent.
    pub fn mark_corrective_action(&mut self) {
        self.corrective_action_completed = true;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn draft() -> SugarEventDraft {
        SugarEventDraft {
            user_id: UserId::random(),
            timestamp: Utc
                .with_ymd_and_hms(2026, 4, 2, 9, 0, 0)
                .single()
                .expect("valid instant"),
            item_name: "  Coffee ".to_owned(),
            sugar_grams: SugarGrams::new(5.0).expect("grams"),
            calories: None,
            category: Some("  ".to_owned()),
            method: InputMethod::Manual,
            is_recommendation: false,
        }
    }

    #[rstest]
    fn pending_normalises_label_and_category(draft: SugarEventDraft) {
        let event = SugarEvent::pending(SugarEventId::random(), draft).expect("valid");
        assert_eq!(event.item_name(), "Coffee");
        assert_eq!(event.category(), None);
        assert_eq!(event.points_earned(), None);
        assert!(!event.corrective_action_completed());
    }

    #[rstest]
    #[case(None, "Evening Walk", true)]
    #[case(Some(" Exercise "), "Yoga", true)]
    #[case(Some("drink"), "Sidewalk Lemonade", true)]
    #[case(Some("drink"), "Soda", false)]
    #[case(None, "Run", false)]
    fn classifies_exercise(
        mut draft: SugarEventDraft,
        #[case] category: Option<&str>,
        #[case] label: &str,
        #[case] expected: bool,
    ) {
        draft.category = category.map(str::to_owned);
        draft.item_name = label.to_owned();
        let event = SugarEvent::pending(SugarEventId::random(), draft).expect("valid");
        assert_eq!(event.is_exercise(), expected);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::INFINITY)]
    fn sugar_grams_rejects_invalid(#[case] grams: f64) {
        assert_eq!(
            SugarGrams::new(grams),
            Err(SugarEventValidationError::InvalidSugarGrams)
        );
    }

    #[rstest]
    fn empty_label_is_rejected(mut draft: SugarEventDraft) {
        draft.item_name = "   ".to_owned();
        assert_eq!(
            SugarEvent::pending(SugarEventId::random(), draft),
            Err(SugarEventValidationError::EmptyItemName)
        );
    }

    #[rstest]
    fn score_is_set_once(draft: SugarEventDraft) {
        let mut event = SugarEvent::pending(SugarEventId::random(), draft).expect("valid");
        assert!(event.score(13));
        assert!(!event.score(2));
        assert_eq!(event.points_earned(), Some(13));
    }

    #[rstest]
    #[case("Auto-Log", InputMethod::AutoLog)]
    #[case("Voice", InputMethod::Voice)]
    fn method_parses_wire_names(#[case] raw: &str, #[case] expected: InputMethod) {
        assert_eq!(raw.parse::<InputMethod>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[test]
    fn method_serialises_auto_log_with_hyphen() {
        let json = serde_json::to_string(&InputMethod::AutoLog).expect("serialise");
        assert_eq!(json, "\"Auto-Log\"");
    }
}
