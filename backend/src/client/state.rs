//! Local engagement state with optimistic logging.
//!
//! [`ClientState`] is an explicit container: every transition is a method
//! taking `&mut self`, so views hold it by reference and nothing is global.
//! History is kept newest first.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{InputMethod, LocalCalendar};
use crate::inbound::http::sugar_events::{LogSugarEventResponseBody, SugarEventBody};
use crate::inbound::http::users::{LeaderboardEntryBody, UserProfileBody};

/// How long a points notification stays visible after reconciliation.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Identifier the client assigns to an optimistic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientEventId(Uuid);

impl ClientEventId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Sync status of one history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Shown locally; the authoritative request is in flight.
    Pending,
    /// Server fields applied.
    Reconciled,
    /// The authoritative request failed; the entry stays as logged locally.
    Unreconciled,
}

/// What the user entered, before the server sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticEvent {
    pub food_name: String,
    pub sugar_grams: f64,
    pub method: InputMethod,
    pub calories: Option<f64>,
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_recommendation: bool,
}

/// One row of the local history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub client_id: ClientEventId,
    /// Server identifier once reconciled or loaded.
    pub server_id: Option<String>,
    pub food_name: String,
    pub sugar_grams: f64,
    pub method: InputMethod,
    pub calories: Option<f64>,
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_recommendation: bool,
    pub points_earned: Option<u32>,
    pub corrective_action_completed: bool,
    pub sync: SyncStatus,
}

impl HistoryEntry {
    fn optimistic(client_id: ClientEventId, event: OptimisticEvent) -> Self {
        Self {
            client_id,
            server_id: None,
            food_name: event.food_name,
            sugar_grams: event.sugar_grams,
            method: event.method,
            calories: event.calories,
            category: event.category,
            timestamp: event.timestamp,
            is_recommendation: event.is_recommendation,
            points_earned: None,
            corrective_action_completed: false,
            sync: SyncStatus::Pending,
        }
    }

    /// Build a reconciled entry from a server record.
    ///
    /// Returns `None` when the server timestamp is not RFC 3339.
    pub fn from_server(body: SugarEventBody) -> Option<Self> {
        let timestamp = DateTime::parse_from_rfc3339(&body.timestamp)
            .ok()?
            .with_timezone(&Utc);
        Some(Self {
            client_id: ClientEventId::random(),
            server_id: Some(body.id),
            food_name: body.food_name,
            sugar_grams: body.sugar_grams,
            method: body.method,
            calories: body.calories,
            category: body.category,
            timestamp,
            is_recommendation: body.is_recommendation,
            points_earned: body.points_earned,
            corrective_action_completed: body.corrective_action_completed,
            sync: SyncStatus::Reconciled,
        })
    }

    fn apply_server(&mut self, body: SugarEventBody) {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(&body.timestamp) {
            self.timestamp = timestamp.with_timezone(&Utc);
        }
        self.server_id = Some(body.id);
        self.food_name = body.food_name;
        self.sugar_grams = body.sugar_grams;
        self.method = body.method;
        self.calories = body.calories;
        self.category = body.category;
        self.is_recommendation = body.is_recommendation;
        self.points_earned = body.points_earned;
        self.corrective_action_completed = body.corrective_action_completed;
        self.sync = SyncStatus::Reconciled;
    }
}

/// Transient points notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub points: u32,
    pub messages: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

/// Local view of one user's engagement.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    calendar: LocalCalendar,
    profile: Option<UserProfileBody>,
    history: Vec<HistoryEntry>,
    leaderboard: Vec<LeaderboardEntryBody>,
    notification: Option<Notification>,
}

impl ClientState {
    pub fn new(calendar: LocalCalendar) -> Self {
        Self {
            calendar,
            ..Self::default()
        }
    }

    pub fn profile(&self) -> Option<&UserProfileBody> {
        self.profile.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntryBody] {
        &self.leaderboard
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn set_profile(&mut self, profile: UserProfileBody) {
        self.profile = Some(profile);
    }

    pub fn set_leaderboard(&mut self, entries: Vec<LeaderboardEntryBody>) {
        self.leaderboard = entries;
    }

    /// Replace history with server records, newest first.
    pub fn replace_history(&mut self, events: Vec<SugarEventBody>) {
        let mut history: Vec<HistoryEntry> = events
            .into_iter()
            .filter_map(HistoryEntry::from_server)
            .collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.history = history;
    }

    /// Show `event` immediately.
    ///
    /// A second submission with the timestamp of an existing entry is a
    /// duplicate and is ignored (`None`).
    pub fn apply_optimistic(&mut self, event: OptimisticEvent) -> Option<ClientEventId> {
        if self
            .history
            .iter()
            .any(|entry| entry.timestamp == event.timestamp)
        {
            return None;
        }
        let client_id = ClientEventId::random();
        let position = self
            .history
            .iter()
            .position(|entry| entry.timestamp < event.timestamp)
            .unwrap_or(self.history.len());
        self.history
            .insert(position, HistoryEntry::optimistic(client_id, event));
        Some(client_id)
    }

    /// Apply the authoritative outcome for `client_id` in place.
    ///
    /// Returns `false`, changing nothing, when the entry has been removed in
    /// the meantime.
    pub fn reconcile(
        &mut self,
        client_id: ClientEventId,
        response: LogSugarEventResponseBody,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(entry) = self
            .history
            .iter_mut()
            .find(|entry| entry.client_id == client_id)
        else {
            return false;
        };
        entry.apply_server(response.event);

        if let Some(corrected) = response.corrected_event_id.as_deref() {
            for spike in self
                .history
                .iter_mut()
                .filter(|entry| entry.server_id.as_deref() == Some(corrected))
            {
                spike.corrective_action_completed = true;
            }
        }

        if let Some(profile) = self.profile.as_mut() {
            profile.points = response.total_points;
            profile.current_streak = response.streak;
        }

        if response.points_earned > 0 {
            let ttl = chrono::Duration::from_std(NOTIFICATION_TTL).unwrap_or_default();
            self.notification = Some(Notification {
                points: response.points_earned,
                messages: response.points_messages,
                expires_at: now + ttl,
            });
        }
        true
    }

    /// Keep the entry but flag it as never confirmed.
    pub fn mark_unreconciled(&mut self, client_id: ClientEventId) -> bool {
        match self
            .history
            .iter_mut()
            .find(|entry| entry.client_id == client_id)
        {
            Some(entry) => {
                entry.sync = SyncStatus::Unreconciled;
                true
            }
            None => false,
        }
    }

    /// Remove an entry from the local view only; awarded points stay.
    pub fn remove(&mut self, client_id: ClientEventId) -> Option<HistoryEntry> {
        let index = self
            .history
            .iter()
            .position(|entry| entry.client_id == client_id)?;
        Some(self.history.remove(index))
    }

    /// Drop the notification once it has expired.
    pub fn dismiss_expired(&mut self, now: DateTime<Utc>) {
        if self
            .notification
            .as_ref()
            .is_some_and(|notification| notification.expires_at <= now)
        {
            self.notification = None;
        }
    }

    /// Grams logged since local midnight.
    pub fn daily_sugar_total(&self, now: DateTime<Utc>) -> f64 {
        let start = self.calendar.start_of_day(now);
        self.history
            .iter()
            .filter(|entry| entry.timestamp >= start)
            .map(|entry| entry.sugar_grams)
            .sum()
    }

    /// Points earned since local midnight.
    pub fn xp_today(&self, now: DateTime<Utc>) -> u64 {
        self.xp_since(self.calendar.start_of_day(now))
    }

    /// Points earned since the start of the local month.
    pub fn xp_month(&self, now: DateTime<Utc>) -> u64 {
        self.xp_since(self.calendar.start_of_month(now))
    }

    fn xp_since(&self, start: DateTime<Utc>) -> u64 {
        self.history
            .iter()
            .filter(|entry| entry.timestamp >= start)
            .filter_map(|entry| entry.points_earned)
            .map(u64::from)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, hour, minute, 0)
            .single()
            .expect("valid instant")
    }

    fn optimistic(name: &str, grams: f64, timestamp: DateTime<Utc>) -> OptimisticEvent {
        OptimisticEvent {
            food_name: name.to_owned(),
            sugar_grams: grams,
            method: InputMethod::Manual,
            calories: None,
            category: None,
            timestamp,
            is_recommendation: false,
        }
    }

    fn server_event(id: &str, name: &str, grams: f64, timestamp: DateTime<Utc>, points: u32) -> SugarEventBody {
        SugarEventBody {
            id: id.to_owned(),
            user_id: Uuid::nil().to_string(),
            food_name: name.to_owned(),
            sugar_grams: grams,
            calories: None,
            category: None,
            method: InputMethod::Manual,
            timestamp: timestamp.to_rfc3339(),
            corrective_action_completed: false,
            points_earned: Some(points),
            is_recommendation: false,
        }
    }

    fn response(event: SugarEventBody, messages: &[&str]) -> LogSugarEventResponseBody {
        LogSugarEventResponseBody {
            points_earned: event.points_earned.unwrap_or(0),
            points_messages: messages.iter().map(|m| (*m).to_owned()).collect(),
            streak: 2,
            total_points: 40,
            corrected_event_id: None,
            event,
        }
    }

    #[fixture]
    fn state() -> ClientState {
        ClientState::new(LocalCalendar::utc())
    }

    #[rstest]
    fn optimistic_entry_updates_daily_total(mut state: ClientState) {
        state.apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0)));
        state.apply_optimistic(optimistic("Apple", 10.0, at(2, 13, 0)));
        state.apply_optimistic(optimistic("Cake", 30.0, at(1, 20, 0)));

        assert_eq!(state.daily_sugar_total(at(2, 18, 0)), 49.0);
        assert_eq!(state.history()[0].food_name, "Apple");
        assert!(state.history().iter().all(|e| e.sync == SyncStatus::Pending));
    }

    #[rstest]
    fn duplicate_timestamp_is_ignored(mut state: ClientState) {
        assert!(state.apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0))).is_some());
        assert!(state.apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0))).is_none());
        assert_eq!(state.history().len(), 1);
    }

    #[rstest]
    fn reconcile_replaces_in_place_and_notifies(mut state: ClientState) {
        let older = state
            .apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0)))
            .expect("applied");
        let newer = state
            .apply_optimistic(optimistic("Walk", 0.0, at(2, 12, 20)))
            .expect("applied");

        let reconciled = state.reconcile(
            older,
            response(server_event("srv-1", "Soda", 39.0, at(2, 12, 0), 8), &["First Check-in (+5)", "Early Bird (+3)"]),
            at(2, 12, 21),
        );

        assert!(reconciled);
        assert_eq!(state.history()[0].client_id, newer);
        assert_eq!(state.history()[1].server_id.as_deref(), Some("srv-1"));
        assert_eq!(state.history()[1].points_earned, Some(8));
        let notification = state.notification().expect("notification shown");
        assert_eq!(notification.points, 8);
        assert_eq!(notification.expires_at, at(2, 12, 21) + chrono::Duration::seconds(4));
    }

    #[rstest]
    fn reconcile_flags_corrected_spike(mut state: ClientState) {
        let soda = state
            .apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0)))
            .expect("applied");
        state.reconcile(soda, response(server_event("spike", "Soda", 39.0, at(2, 12, 0), 5), &[]), at(2, 12, 1));
        let walk = state
            .apply_optimistic(optimistic("Walk", 0.0, at(2, 12, 20)))
            .expect("applied");

        let mut outcome = response(server_event("walk", "Walk", 0.0, at(2, 12, 20), 12), &["Spike Crushed (+7)"]);
        outcome.corrected_event_id = Some("spike".to_owned());
        state.reconcile(walk, outcome, at(2, 12, 21));

        let spike = state
            .history()
            .iter()
            .find(|e| e.server_id.as_deref() == Some("spike"))
            .expect("spike kept");
        assert!(spike.corrective_action_completed);
    }

    #[rstest]
    fn zero_points_do_not_notify(mut state: ClientState) {
        let id = state
            .apply_optimistic(optimistic("Cake", 45.0, at(2, 20, 0)))
            .expect("applied");
        state.reconcile(id, response(server_event("c", "Cake", 45.0, at(2, 20, 0), 0), &[]), at(2, 20, 1));
        assert!(state.notification().is_none());
    }

    #[rstest]
    fn removed_entry_discards_late_response(mut state: ClientState) {
        let id = state
            .apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0)))
            .expect("applied");
        assert!(state.remove(id).is_some());

        let applied = state.reconcile(
            id,
            response(server_event("srv", "Soda", 39.0, at(2, 12, 0), 8), &["First Check-in (+5)"]),
            at(2, 12, 1),
        );

        assert!(!applied);
        assert!(state.history().is_empty());
        assert!(state.notification().is_none());
    }

    #[rstest]
    fn failed_request_leaves_entry_unreconciled(mut state: ClientState) {
        let id = state
            .apply_optimistic(optimistic("Soda", 39.0, at(2, 12, 0)))
            .expect("applied");
        assert!(state.mark_unreconciled(id));
        assert_eq!(state.history()[0].sync, SyncStatus::Unreconciled);
        assert_eq!(state.history()[0].points_earned, None);
    }

    #[rstest]
    fn notification_expires_after_ttl(mut state: ClientState) {
        let id = state
            .apply_optimistic(optimistic("Apple", 3.0, at(2, 9, 0)))
            .expect("applied");
        state.reconcile(id, response(server_event("a", "Apple", 3.0, at(2, 9, 0), 13), &["Healthy Choice (+5)"]), at(2, 9, 0));

        state.dismiss_expired(at(2, 9, 0) + chrono::Duration::seconds(3));
        assert!(state.notification().is_some());
        state.dismiss_expired(at(2, 9, 0) + chrono::Duration::seconds(4));
        assert!(state.notification().is_none());
    }

    #[rstest]
    fn xp_windows_follow_calendar(mut state: ClientState) {
        state.replace_history(vec![
            server_event("a", "Apple", 3.0, at(2, 9, 0), 13),
            server_event("b", "Soda", 39.0, at(1, 12, 0), 5),
        ]);
        assert_eq!(state.xp_today(at(2, 18, 0)), 13);
        assert_eq!(state.xp_month(at(2, 18, 0)), 18);
    }
}
