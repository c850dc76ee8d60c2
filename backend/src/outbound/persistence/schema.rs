//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. They are used by
//! Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, regenerate this file with
//! `diesel print-schema` or update it by hand.

diesel::table! {
    /// Portal accounts.
    users (user_id) {
        /// Primary key.
        user_id -> Int8,
        /// Display name.
        name -> Text,
        /// Unique login and notification address.
        email -> Text,
        /// `student`, `admin`, or `master`.
        role -> Text,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Events open for registration.
    events (event_id) {
        /// Primary key.
        event_id -> Int8,
        /// Display name.
        event_name -> Text,
        /// Free-form description shown on the listing.
        event_description -> Text,
        /// Where the event takes place.
        venue -> Nullable<Text>,
        /// Scheduled start; unscheduled when null.
        event_start_time -> Nullable<Timestamptz>,
        /// Scheduled end; open-ended when null.
        event_end_time -> Nullable<Timestamptz>,
        /// Smallest accepted team.
        min_team_size -> Int4,
        /// Largest accepted team; `1` marks a solo event.
        max_team_size -> Int4,
        /// Registration window start; open when null.
        reg_start_time -> Nullable<Timestamptz>,
        /// Registration window end; open when null.
        reg_end_time -> Nullable<Timestamptz>,
        /// Fee per capacity unit in paise.
        fee_amount_minor -> Int8,
        /// Cap on paid capacity units.
        max_registrations -> Nullable<Int4>,
        /// `active` or `inactive`.
        status -> Text,
    }
}

diesel::table! {
    /// Accommodation options.
    accommodations (accommodation_id) {
        /// Primary key.
        accommodation_id -> Int4,
        /// Display label.
        accommodation -> Text,
    }
}

diesel::table! {
    /// One row per `(student, event)` pair.
    registrations (registration_id) {
        /// Primary key.
        registration_id -> Int8,
        /// Registrant.
        student_id -> Int8,
        /// Event registered for.
        event_id -> Int8,
        /// Whether the capacity unit is paid.
        payment_status -> Bool,
        /// Selected accommodation.
        accommodation_id -> Nullable<Int4>,
        /// Selected food preference.
        food_preference -> Text,
        /// `absent` or `present`.
        attendance_status -> Text,
        /// Team name reserved until the lead's payment clears.
        pending_team_name -> Nullable<Text>,
        /// Insert timestamp.
        registered_at -> Timestamptz,
    }
}

diesel::table! {
    /// Materialized teams.
    teams (team_id) {
        /// Primary key.
        team_id -> Int8,
        /// Owning event.
        event_id -> Int8,
        /// Name, unique case-insensitively per event.
        team_name -> Text,
        /// Six-character join code, unique per event.
        team_code -> Text,
        /// Creator and payer.
        team_lead_id -> Int8,
        /// Materialization timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Membership links, one per registration.
    team_registrations (registration_id) {
        /// Member registration.
        registration_id -> Int8,
        /// Team joined.
        team_id -> Int8,
        /// Join timestamp.
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Gateway payments, one per registration.
    payments (payment_id) {
        /// Primary key.
        payment_id -> Int8,
        /// Registration paid for.
        registration_id -> Int8,
        /// Gateway order id.
        gateway_order_id -> Text,
        /// Gateway payment id once verified.
        gateway_payment_id -> Nullable<Text>,
        /// Verified signature.
        gateway_signature -> Nullable<Text>,
        /// Amount in paise.
        amount_minor -> Int8,
        /// ISO currency code.
        currency -> Text,
        /// `pending`, `completed`, `failed`, or `refunded`.
        status -> Text,
        /// Row creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(registrations -> users (student_id));
diesel::joinable!(registrations -> events (event_id));
diesel::joinable!(teams -> events (event_id));
diesel::joinable!(teams -> users (team_lead_id));
diesel::joinable!(team_registrations -> registrations (registration_id));
diesel::joinable!(team_registrations -> teams (team_id));
diesel::joinable!(payments -> registrations (registration_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    events,
    accommodations,
    registrations,
    teams,
    team_registrations,
    payments,
);
