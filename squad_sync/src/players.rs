//! Roster read models for the dashboard UI.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::SqliteConnection;
use diesel::prelude::*;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::models::{Player, PlayerChange, PlayerSnapshot};
use crate::schema::{player_changes, player_snapshots, players};
use crate::sync::parse_bag;
use crate::weekly::{self, FieldDelta, PlayerWeeklyDiff};

/// A player's latest snapshot, bag parsed back into JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    /// Snapshot row id.
    pub snapshot_id: i32,
    /// Fetch timestamp (RFC3339 UTC).
    pub fetched_at: String,
    /// The raw attribute bag.
    pub data: Value,
}

/// One audit-trail entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeView {
    /// Change row id.
    pub change_id: i32,
    /// Key into the raw attribute bag.
    pub field_name: String,
    /// Serialized previous value.
    pub old_value: Option<String>,
    /// Serialized new value.
    pub new_value: Option<String>,
    /// Recording timestamp (RFC3339 UTC).
    pub recorded_at: String,
    /// Snapshot that introduced the change.
    pub snapshot_id: i32,
}

/// Roster entry with the latest snapshot and recent changes attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWithLatest {
    /// External player id.
    pub player_id: i64,
    /// Owning team id.
    pub team_id: i64,
    /// Display name.
    pub name: String,
    /// False once the player left the roster.
    pub active: bool,
    /// Latest snapshot, when one exists.
    pub latest_snapshot: Option<SnapshotView>,
    /// The most recent change rows, newest first.
    pub recent_changes: Vec<ChangeView>,
    /// Weekly tracked-field deltas.
    pub weekly_diff: Option<IndexMap<String, FieldDelta>>,
}

/// One player with their complete change history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWithHistory {
    /// External player id.
    pub player_id: i64,
    /// Owning team id.
    pub team_id: i64,
    /// Display name.
    pub name: String,
    /// False once the player left the roster.
    pub active: bool,
    /// Latest snapshot, when one exists.
    pub latest_snapshot: Option<SnapshotView>,
    /// Full audit trail, newest first.
    pub changes: Vec<ChangeView>,
    /// Weekly tracked-field deltas.
    pub weekly_diff: Option<IndexMap<String, FieldDelta>>,
}

/// All players ordered by external id, each with latest snapshot, the `N`
/// most recent changes, and the weekly diff attached.
pub fn list_players(
    conn: &mut SqliteConnection,
    recent_changes_limit: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<PlayerWithLatest>> {
    let roster: Vec<Player> = players::table
        .order(players::player_id.asc())
        .select(Player::as_select())
        .load(conn)?;

    let external_ids: Vec<i64> = roster.iter().map(|p| p.player_id).collect();
    let mut diff_map: HashMap<i64, PlayerWeeklyDiff> = weekly::weekly_diffs(conn, &external_ids, now)?
        .into_iter()
        .map(|diff| (diff.player_id, diff))
        .collect();

    let mut out = Vec::with_capacity(roster.len());
    for player in roster {
        let latest = load_snapshot(conn, player.latest_snapshot_id)?;
        let recent: Vec<PlayerChange> = player_changes::table
            .filter(player_changes::player_id.eq(player.id))
            .order(player_changes::recorded_at.desc())
            .limit(recent_changes_limit)
            .select(PlayerChange::as_select())
            .load(conn)?;

        out.push(PlayerWithLatest {
            player_id: player.player_id,
            team_id: player.team_id,
            name: player.name,
            active: player.active,
            latest_snapshot: latest.map(snapshot_view),
            recent_changes: recent.into_iter().map(change_view).collect(),
            weekly_diff: diff_map.remove(&player.player_id).map(|diff| diff.changes),
        });
    }
    Ok(out)
}

/// One player (by external id) with the full change history, or `None`.
pub fn find_player_with_history(
    conn: &mut SqliteConnection,
    external_player_id: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<PlayerWithHistory>> {
    let Some(player) = players::table
        .filter(players::player_id.eq(external_player_id))
        .select(Player::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let latest = load_snapshot(conn, player.latest_snapshot_id)?;
    let changes: Vec<PlayerChange> = player_changes::table
        .filter(player_changes::player_id.eq(player.id))
        .order(player_changes::recorded_at.desc())
        .select(PlayerChange::as_select())
        .load(conn)?;
    let weekly_diff = weekly::weekly_diffs(conn, &[player.player_id], now)?
        .into_iter()
        .next()
        .map(|diff| diff.changes);

    Ok(Some(PlayerWithHistory {
        player_id: player.player_id,
        team_id: player.team_id,
        name: player.name,
        active: player.active,
        latest_snapshot: latest.map(snapshot_view),
        changes: changes.into_iter().map(change_view).collect(),
        weekly_diff,
    }))
}

fn load_snapshot(
    conn: &mut SqliteConnection,
    snapshot_id: Option<i32>,
) -> anyhow::Result<Option<PlayerSnapshot>> {
    let Some(snapshot_id) = snapshot_id else {
        return Ok(None);
    };
    Ok(player_snapshots::table
        .find(snapshot_id)
        .select(PlayerSnapshot::as_select())
        .first(conn)
        .optional()?)
}

fn snapshot_view(snapshot: PlayerSnapshot) -> SnapshotView {
    SnapshotView {
        snapshot_id: snapshot.id,
        fetched_at: snapshot.fetched_at.clone(),
        data: Value::Object(parse_bag(&snapshot.data)),
    }
}

fn change_view(change: PlayerChange) -> ChangeView {
    ChangeView {
        change_id: change.id,
        field_name: change.field_name,
        old_value: change.old_value,
        new_value: change.new_value,
        recorded_at: change.recorded_at,
        snapshot_id: change.snapshot_id,
    }
}
