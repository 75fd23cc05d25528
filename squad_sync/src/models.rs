//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables created by the embedded migrations and
//! declared in [`crate::schema`]:
//! - [`crate::schema::players`]: one row per tracked player, soft-deleted
//!   via `active`, with a nullable pointer to the latest snapshot
//! - [`crate::schema::player_snapshots`]: append-only attribute-bag
//!   captures, content-hashed
//! - [`crate::schema::player_changes`]: append-only field-level audit trail
//! - [`crate::schema::matches`]: one row per external match id
//! - [`crate::schema::sync_runs`]: one row per sync invocation
//!
//! All timestamps are RFC3339 UTC text (see [`crate::tz`]).

use diesel::prelude::*;

use crate::schema::*;

/// A row in [`crate::schema::players`]: one (player_id, team_id) pair.
///
/// Created on first sync observation and never hard-deleted; `active`
/// flips false when the player disappears from the fetched roster.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = players, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Player {
    /// Database primary key.
    pub id: i32,
    /// Hattrick's global player id.
    pub player_id: i64,
    /// Owning team id.
    pub team_id: i64,
    /// Display name, refreshed on every sync.
    pub name: String,
    /// False once the player leaves the fetched roster.
    pub active: bool,
    /// Weak pointer to the newest snapshot; NULL before the first snapshot.
    pub latest_snapshot_id: Option<i32>,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: String,
    /// Row update timestamp (RFC3339 UTC).
    pub updated_at: String,
}

/// Insertable form of [`Player`].
#[derive(Debug, Insertable)]
#[diesel(table_name = players)]
pub struct NewPlayer<'a> {
    /// Hattrick's global player id.
    pub player_id: i64,
    /// Owning team id.
    pub team_id: i64,
    /// Display name.
    pub name: &'a str,
    /// Newly observed players always start active.
    pub active: bool,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: &'a str,
    /// Row update timestamp (RFC3339 UTC).
    pub updated_at: &'a str,
}

/// A row in [`crate::schema::player_snapshots`]: one immutable capture of a
/// player's raw attribute bag. Never mutated or deleted.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = player_snapshots, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Player))]
pub struct PlayerSnapshot {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Player::id`].
    pub player_id: i32,
    /// Fetch timestamp (RFC3339 UTC).
    pub fetched_at: String,
    /// The raw attribute bag as a JSON object, key order preserved.
    pub data: String,
    /// SHA-1 hex digest of `data`; equal hashes mean "no observable change".
    pub hash: String,
}

/// Insertable form of [`PlayerSnapshot`].
#[derive(Debug, Insertable)]
#[diesel(table_name = player_snapshots)]
pub struct NewPlayerSnapshot<'a> {
    /// FK to [`Player::id`].
    pub player_id: i32,
    /// Fetch timestamp (RFC3339 UTC).
    pub fetched_at: &'a str,
    /// The raw attribute bag as JSON text.
    pub data: &'a str,
    /// SHA-1 hex digest of `data`.
    pub hash: &'a str,
}

/// A row in [`crate::schema::player_changes`]: one field whose serialized
/// value differs between two consecutive snapshots. Append-only audit trail.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = player_changes, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(PlayerSnapshot, foreign_key = snapshot_id))]
pub struct PlayerChange {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Player::id`].
    pub player_id: i32,
    /// FK to the snapshot that introduced the change.
    pub snapshot_id: i32,
    /// Key into the raw attribute bag.
    pub field_name: String,
    /// Serialized previous value; NULL when the field appeared.
    pub old_value: Option<String>,
    /// Serialized new value; NULL when the field vanished.
    pub new_value: Option<String>,
    /// Recording timestamp (RFC3339 UTC).
    pub recorded_at: String,
}

/// Insertable form of [`PlayerChange`].
#[derive(Debug, Insertable)]
#[diesel(table_name = player_changes)]
pub struct NewPlayerChange<'a> {
    /// FK to [`Player::id`].
    pub player_id: i32,
    /// FK to the snapshot that introduced the change.
    pub snapshot_id: i32,
    /// Key into the raw attribute bag.
    pub field_name: &'a str,
    /// Serialized previous value.
    pub old_value: Option<&'a str>,
    /// Serialized new value.
    pub new_value: Option<&'a str>,
    /// Recording timestamp (RFC3339 UTC).
    pub recorded_at: &'a str,
}

/// A row in [`crate::schema::matches`], keyed uniquely by the external
/// match id. Score/status fields are updated in place on later syncs.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = matches, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Match {
    /// Database primary key.
    pub id: i32,
    /// Hattrick's global match id (unique).
    pub match_id: i64,
    /// The tracked team's id.
    pub team_id: i64,
    /// Kick-off time (RFC3339 UTC).
    pub match_date: String,
    /// Home side id.
    pub home_team_id: i64,
    /// Home side name.
    pub home_team_name: String,
    /// Home side short name, if any.
    pub home_team_short_name: Option<String>,
    /// Away side id.
    pub away_team_id: i64,
    /// Away side name.
    pub away_team_name: String,
    /// Away side short name, if any.
    pub away_team_short_name: Option<String>,
    /// Home goals.
    pub home_goals: i32,
    /// Away goals.
    pub away_goals: i32,
    /// "FINISHED" | "ONGOING" | "UPCOMING".
    pub status: String,
    /// Match category ("LEAGUE", "CUP", ...).
    pub match_type: String,
    /// Series/cup context id.
    pub match_context_id: i64,
    /// Cup round, for cup matches.
    pub cup_level: Option<i32>,
    /// Cup round index, for cup matches.
    pub cup_level_index: Option<i32>,
    /// Originating system tag.
    pub source_system: Option<String>,
    /// Whether lineup orders were submitted.
    pub orders_given: Option<bool>,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: String,
    /// Row update timestamp (RFC3339 UTC).
    pub updated_at: String,
}

/// Insertable form of [`Match`].
#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch<'a> {
    /// Hattrick's global match id.
    pub match_id: i64,
    /// The tracked team's id.
    pub team_id: i64,
    /// Kick-off time (RFC3339 UTC).
    pub match_date: &'a str,
    /// Home side id.
    pub home_team_id: i64,
    /// Home side name.
    pub home_team_name: &'a str,
    /// Home side short name.
    pub home_team_short_name: Option<&'a str>,
    /// Away side id.
    pub away_team_id: i64,
    /// Away side name.
    pub away_team_name: &'a str,
    /// Away side short name.
    pub away_team_short_name: Option<&'a str>,
    /// Home goals.
    pub home_goals: i32,
    /// Away goals.
    pub away_goals: i32,
    /// Progress state.
    pub status: &'a str,
    /// Match category.
    pub match_type: &'a str,
    /// Series/cup context id.
    pub match_context_id: i64,
    /// Cup round.
    pub cup_level: Option<i32>,
    /// Cup round index.
    pub cup_level_index: Option<i32>,
    /// Originating system tag.
    pub source_system: Option<&'a str>,
    /// Orders-submitted flag.
    pub orders_given: Option<bool>,
    /// Row creation timestamp (RFC3339 UTC).
    pub created_at: &'a str,
    /// Row update timestamp (RFC3339 UTC).
    pub updated_at: &'a str,
}

/// The fields a repeat match sync is allowed to touch.
///
/// `treat_none_as_null` makes a `None` orders-given flag clear the column
/// instead of leaving a stale value behind.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = matches, treat_none_as_null = true)]
pub struct MatchScoreUpdate<'a> {
    /// Home goals.
    pub home_goals: i32,
    /// Away goals.
    pub away_goals: i32,
    /// Progress state.
    pub status: &'a str,
    /// Orders-submitted flag.
    pub orders_given: Option<bool>,
    /// Row update timestamp (RFC3339 UTC).
    pub updated_at: &'a str,
}

/// A row in [`crate::schema::sync_runs`]: the audit record of one sync
/// invocation. Created PENDING, finalized exactly once.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = sync_runs, check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRun {
    /// Database primary key.
    pub id: i32,
    /// Request timestamp (RFC3339 UTC).
    pub started_at: String,
    /// Completion timestamp; NULL while the run is in flight.
    pub completed_at: Option<String>,
    /// "PENDING" | "SUCCESS" | "FAILED".
    pub status: String,
    /// Failure detail for FAILED runs.
    pub message: Option<String>,
    /// Total change rows produced by the run.
    pub changes_count: i32,
}

/// Insertable form of [`SyncRun`].
#[derive(Debug, Insertable)]
#[diesel(table_name = sync_runs)]
pub struct NewSyncRun<'a> {
    /// Request timestamp (RFC3339 UTC).
    pub started_at: &'a str,
    /// Initial status, always [`SyncStatus::Pending`].
    pub status: &'a str,
    /// Starts at zero.
    pub changes_count: i32,
}

/// Lifecycle states of a [`SyncRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Run created, still executing.
    Pending,
    /// Run finished cleanly.
    Success,
    /// Run aborted; `message` carries the error.
    Failed,
}

impl SyncStatus {
    /// Stable storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Pending => "PENDING",
            SyncStatus::Success => "SUCCESS",
            SyncStatus::Failed => "FAILED",
        }
    }
}
