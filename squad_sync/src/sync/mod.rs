//! End-to-end squad synchronization.
//!
//! ## What this does
//! - Fetches the roster (and avatars) from the CHPP feed and merges each
//!   player's avatar into their raw attribute bag under `"Avatar"`.
//! - Per player: upsert, content-hash comparison against the latest stored
//!   snapshot, and (only when the hash moved) a new snapshot plus
//!   field-level change rows.
//! - Deactivates players that vanished from the fetched roster, runs the
//!   match sub-sync, and records the whole run in `sync_runs`.
//!
//! ## Transactions & consistency
//! Each player's upsert/snapshot/pointer/changes sequence runs inside one
//! `immediate_transaction`, so the `latest_snapshot_id` pointer can never be
//! observed referencing a snapshot whose change rows are missing. Player
//! transactions are independent of each other: a failure aborts the run but
//! leaves earlier players' commits in place; only the `sync_runs` row
//! reflects the failure.
//!
//! ## Failure semantics
//! A feed, parse, or storage error aborts the run, marks the `sync_runs`
//! row FAILED with the error message, and propagates to the caller. An
//! *empty* roster response is not an error, but it also does not deactivate
//! anyone; that guard keeps one bad fetch from wiping the whole roster.

pub mod diff;
pub mod hash;

use std::collections::HashMap;

use anyhow::Context;
use chpp_client::ChppFeed;
use chpp_client::models::{ChppAvatar, ChppPlayer};
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

use crate::matches;
use crate::models::{
    NewPlayer, NewPlayerChange, NewPlayerSnapshot, NewSyncRun, Player, PlayerSnapshot, SyncStatus,
};
use crate::schema::{player_changes, player_snapshots, players, sync_runs};
use crate::tz;

/// Aggregate result of one sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// Id of the `sync_runs` audit row.
    pub sync_run_id: i32,
    /// Players present in the fetched roster.
    pub total_players: usize,
    /// Players observed for the first time.
    pub players_created: usize,
    /// Existing players with at least one field change.
    pub players_updated: usize,
    /// Total change rows written.
    pub total_changes: usize,
}

struct SyncTotals {
    total_players: usize,
    players_created: usize,
    players_updated: usize,
    total_changes: usize,
}

struct PlayerOutcome {
    created: bool,
    updated: bool,
    changes: usize,
}

/// Run one full sync cycle: players, avatars, deactivation, matches.
///
/// Creates the PENDING `sync_runs` row up front and finalizes it exactly
/// once: SUCCESS with the change count, or FAILED with the error message
/// before the error is re-raised.
pub async fn run_player_sync<F>(
    conn: &mut SqliteConnection,
    feed: &F,
    team_id: i64,
) -> anyhow::Result<SyncSummary>
where
    F: ChppFeed + Sync + ?Sized,
{
    let started_at = tz::to_rfc3339_millis(Utc::now());
    let run_id: i32 = diesel::insert_into(sync_runs::table)
        .values(NewSyncRun {
            started_at: &started_at,
            status: SyncStatus::Pending.as_str(),
            changes_count: 0,
        })
        .returning(sync_runs::id)
        .get_result(conn)?;

    info!(run_id, team_id, "starting squad sync");

    match sync_all(conn, feed, team_id).await {
        Ok(totals) => {
            diesel::update(sync_runs::table.find(run_id))
                .set((
                    sync_runs::status.eq(SyncStatus::Success.as_str()),
                    sync_runs::completed_at.eq(Some(tz::to_rfc3339_millis(Utc::now()))),
                    sync_runs::changes_count.eq(totals.total_changes as i32),
                ))
                .execute(conn)?;
            info!(
                run_id,
                created = totals.players_created,
                updated = totals.players_updated,
                changes = totals.total_changes,
                "squad sync finished"
            );
            Ok(SyncSummary {
                sync_run_id: run_id,
                total_players: totals.total_players,
                players_created: totals.players_created,
                players_updated: totals.players_updated,
                total_changes: totals.total_changes,
            })
        }
        Err(err) => {
            let message = format!("{err:#}");
            if let Err(update_err) = diesel::update(sync_runs::table.find(run_id))
                .set((
                    sync_runs::status.eq(SyncStatus::Failed.as_str()),
                    sync_runs::completed_at.eq(Some(tz::to_rfc3339_millis(Utc::now()))),
                    sync_runs::message.eq(Some(message.as_str())),
                ))
                .execute(conn)
            {
                error!(run_id, %update_err, "could not record sync failure");
            }
            error!(run_id, %message, "squad sync failed");
            Err(err)
        }
    }
}

async fn sync_all<F>(
    conn: &mut SqliteConnection,
    feed: &F,
    team_id: i64,
) -> anyhow::Result<SyncTotals>
where
    F: ChppFeed + Sync + ?Sized,
{
    let mut fetched = feed.fetch_players().await.context("fetching CHPP players")?;
    let avatars = feed.fetch_avatars().await.context("fetching CHPP avatars")?;
    merge_avatars(&mut fetched, avatars);
    info!(count = fetched.len(), "retrieved players from CHPP");

    let mut totals = SyncTotals {
        total_players: fetched.len(),
        players_created: 0,
        players_updated: 0,
        total_changes: 0,
    };
    let mut seen_ids: Vec<i64> = Vec::with_capacity(fetched.len());

    for player in &fetched {
        seen_ids.push(player.player_id);
        let outcome =
            conn.immediate_transaction::<_, anyhow::Error, _>(|conn| sync_one_player(conn, player))?;
        if outcome.created {
            totals.players_created += 1;
        }
        if outcome.updated {
            totals.players_updated += 1;
        }
        totals.total_changes += outcome.changes;
    }

    if !seen_ids.is_empty() {
        let now = tz::to_rfc3339_millis(Utc::now());
        let demoted = diesel::update(
            players::table.filter(
                players::team_id
                    .eq(team_id)
                    .and(players::active.eq(true))
                    .and(players::player_id.ne_all(&seen_ids)),
            ),
        )
        .set((players::active.eq(false), players::updated_at.eq(&now)))
        .execute(conn)?;
        if demoted > 0 {
            info!(demoted, "deactivated players missing from the roster");
        }
    }

    let match_summary = matches::sync_matches(conn, feed, team_id).await?;
    info!(
        added = match_summary.matches_added,
        total = match_summary.total_matches,
        "match sync finished"
    );

    Ok(totals)
}

/// One player's atomic sync step. Runs inside an immediate transaction.
fn sync_one_player(conn: &mut SqliteConnection, fetched: &ChppPlayer) -> anyhow::Result<PlayerOutcome> {
    let existing: Option<Player> = players::table
        .filter(
            players::player_id
                .eq(fetched.player_id)
                .and(players::team_id.eq(fetched.team_id)),
        )
        .select(Player::as_select())
        .first(conn)
        .optional()?;

    let now = tz::to_rfc3339_millis(Utc::now());
    let row_id = match &existing {
        Some(row) => {
            diesel::update(players::table.find(row.id))
                .set((
                    players::name.eq(&fetched.name),
                    players::active.eq(true),
                    players::updated_at.eq(&now),
                ))
                .execute(conn)?;
            row.id
        }
        None => diesel::insert_into(players::table)
            .values(NewPlayer {
                player_id: fetched.player_id,
                team_id: fetched.team_id,
                name: &fetched.name,
                active: true,
                created_at: &now,
                updated_at: &now,
            })
            .returning(players::id)
            .get_result(conn)?,
    };

    let previous: Option<PlayerSnapshot> =
        match existing.as_ref().and_then(|row| row.latest_snapshot_id) {
            Some(snapshot_id) => player_snapshots::table
                .find(snapshot_id)
                .select(PlayerSnapshot::as_select())
                .first(conn)
                .optional()?,
            None => None,
        };

    let new_bag = Value::Object(fetched.raw.clone());
    let new_hash = hash::hash_value(&new_bag);

    if let Some(prev) = &previous {
        if prev.hash == new_hash {
            // Unchanged: skip snapshot and diff entirely. The player still
            // counts as seen for deactivation purposes.
            return Ok(PlayerOutcome {
                created: existing.is_none(),
                updated: false,
                changes: 0,
            });
        }
    }

    let data = new_bag.to_string();
    let snapshot_id: i32 = diesel::insert_into(player_snapshots::table)
        .values(NewPlayerSnapshot {
            player_id: row_id,
            fetched_at: &now,
            data: &data,
            hash: &new_hash,
        })
        .returning(player_snapshots::id)
        .get_result(conn)?;

    diesel::update(players::table.find(row_id))
        .set(players::latest_snapshot_id.eq(Some(snapshot_id)))
        .execute(conn)?;

    // A brand-new player's first snapshot is the baseline; diffs only exist
    // for players we had seen before.
    let diffs = if existing.is_some() {
        let previous_bag = previous
            .as_ref()
            .map(|snapshot| parse_bag(&snapshot.data))
            .unwrap_or_default();
        diff::diff_bags(&previous_bag, &fetched.raw)
    } else {
        Vec::new()
    };

    if !diffs.is_empty() {
        let rows: Vec<NewPlayerChange<'_>> = diffs
            .iter()
            .map(|change| NewPlayerChange {
                player_id: row_id,
                snapshot_id,
                field_name: &change.field_name,
                old_value: change.old_value.as_deref(),
                new_value: change.new_value.as_deref(),
                recorded_at: &now,
            })
            .collect();
        diesel::insert_into(player_changes::table)
            .values(&rows)
            .execute(conn)?;
    }

    Ok(PlayerOutcome {
        created: existing.is_none(),
        updated: existing.is_some() && !diffs.is_empty(),
        changes: diffs.len(),
    })
}

/// Parse a stored snapshot bag; unreadable or non-object data reads as empty.
pub(crate) fn parse_bag(data: &str) -> Map<String, Value> {
    serde_json::from_str::<Value>(data)
        .ok()
        .and_then(|value| value.as_object().cloned())
        .unwrap_or_default()
}

fn merge_avatars(players: &mut [ChppPlayer], avatars: Vec<ChppAvatar>) {
    let by_id: HashMap<i64, ChppAvatar> =
        avatars.into_iter().map(|a| (a.player_id, a)).collect();
    for player in players {
        if let Some(avatar) = by_id.get(&player.player_id) {
            let layers: Vec<Value> = avatar
                .layers
                .iter()
                .map(|layer| json!({"Image": layer.image_url, "X": layer.x, "Y": layer.y}))
                .collect();
            player.raw.insert(
                "Avatar".to_string(),
                json!({
                    "BackgroundImage": avatar.background_image_url,
                    "Layers": layers,
                }),
            );
        }
    }
}
