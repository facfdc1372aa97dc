//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// User profiles, including engagement totals.
    users (id) {
        id -> Uuid,
        /// Client-generated handle, unique.
        anonymous_id -> Varchar,
        /// Optional public username, unique when set.
        username -> Nullable<Varchar>,
        name -> Varchar,
        gender -> Varchar,
        age -> Int2,
        height_cm -> Float8,
        weight_kg -> Float8,
        daily_limit_grams -> Float8,
        avatar -> Varchar,
        onboarded -> Bool,
        steps -> Int4,
        sleep_hours -> Float8,
        /// Lifetime points; only ever incremented.
        points -> Int8,
        current_streak -> Int4,
        last_log_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Logged sugar intake and activity events.
    sugar_events (id) {
        id -> Uuid,
        user_id -> Uuid,
        occurred_at -> Timestamptz,
        item_name -> Varchar,
        sugar_grams -> Float8,
        calories -> Nullable<Float8>,
        category -> Nullable<Varchar>,
        method -> Varchar,
        corrective_action_completed -> Bool,
        /// `NULL` until the event has been scored.
        points_earned -> Nullable<Int4>,
        is_recommendation -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(sugar_events -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(sugar_events, users);
