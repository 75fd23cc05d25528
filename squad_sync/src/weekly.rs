//! Weekly numeric deltas over a fixed set of tracked snapshot fields.
//!
//! Read-side enrichment only: nothing here is persisted. For each player the
//! "current" value comes from the newest snapshot and the "previous" value
//! from the newest snapshot at least seven days old (falling back to the
//! oldest available one, which for a single-snapshot player is the current
//! snapshot itself: deltas of zero, never an error).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use diesel::SqliteConnection;
use diesel::prelude::*;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::models::PlayerSnapshot;
use crate::schema::{player_snapshots, players};
use crate::sync::parse_bag;
use crate::tz;

/// The numeric fields tracked week over week: TSI, form, experience,
/// stamina, and the six position skills plus set pieces.
pub const TRACKED_FIELDS: [&str; 11] = [
    "TSI",
    "PlayerForm",
    "Experience",
    "StaminaSkill",
    "KeeperSkill",
    "PlaymakerSkill",
    "ScorerSkill",
    "PassingSkill",
    "WingerSkill",
    "DefenderSkill",
    "SetPiecesSkill",
];

/// Current/previous/delta triple for one tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDelta {
    /// Value in the newest snapshot, when numeric.
    pub current: Option<f64>,
    /// Value in the week-old snapshot, when numeric.
    pub previous: Option<f64>,
    /// `current - previous` when both sides are present.
    pub delta: Option<f64>,
}

/// Weekly deltas for one player, keyed by tracked field name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWeeklyDiff {
    /// External player id.
    pub player_id: i64,
    /// Id of the newest snapshot, if the player has one.
    pub snapshot_id: Option<i32>,
    /// Per-field deltas, in [`TRACKED_FIELDS`] order.
    pub changes: IndexMap<String, FieldDelta>,
}

/// Compute weekly diffs for the given external player ids.
pub fn weekly_diffs(
    conn: &mut SqliteConnection,
    player_ids: &[i64],
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<PlayerWeeklyDiff>> {
    if player_ids.is_empty() {
        return Ok(Vec::new());
    }
    let cutoff = now - Duration::days(7);

    let rows: Vec<(i64, PlayerSnapshot)> = player_snapshots::table
        .inner_join(players::table)
        .filter(players::player_id.eq_any(player_ids))
        .order(player_snapshots::fetched_at.desc())
        .select((players::player_id, PlayerSnapshot::as_select()))
        .load(conn)?;

    let mut grouped: HashMap<i64, Vec<PlayerSnapshot>> = HashMap::new();
    for (external_id, snapshot) in rows {
        grouped.entry(external_id).or_default().push(snapshot);
    }

    let mut results = Vec::with_capacity(player_ids.len());
    for &external_id in player_ids {
        let snapshots = grouped
            .get(&external_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let current = snapshots.first();
        let previous = pick_previous(snapshots, cutoff);

        let current_bag = current.map(|s| parse_bag(&s.data)).unwrap_or_default();
        let previous_bag = previous.map(|s| parse_bag(&s.data)).unwrap_or_default();

        let mut changes = IndexMap::with_capacity(TRACKED_FIELDS.len());
        for field in TRACKED_FIELDS {
            let current_value = current_bag.get(field).and_then(safe_number);
            let previous_value = previous_bag.get(field).and_then(safe_number);
            let delta = match (current_value, previous_value) {
                (Some(current), Some(previous)) => Some(current - previous),
                _ => None,
            };
            changes.insert(
                field.to_string(),
                FieldDelta {
                    current: current_value,
                    previous: previous_value,
                    delta,
                },
            );
        }

        results.push(PlayerWeeklyDiff {
            player_id: external_id,
            snapshot_id: current.map(|s| s.id),
            changes,
        });
    }
    Ok(results)
}

/// Walk newest-first (skipping the current snapshot) and take the first
/// snapshot at least a week old; otherwise the oldest available. With a
/// single snapshot that is the current one itself.
fn pick_previous(snapshots: &[PlayerSnapshot], cutoff: DateTime<Utc>) -> Option<&PlayerSnapshot> {
    if snapshots.len() <= 1 {
        return snapshots.first();
    }
    for snapshot in &snapshots[1..] {
        if let Ok(fetched) = tz::parse_rfc3339_utc(&snapshot.fetched_at) {
            if fetched <= cutoff {
                return Some(snapshot);
            }
        }
    }
    snapshots.last()
}

/// Best-effort numeric read; non-numeric and missing values are `None`.
fn safe_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
