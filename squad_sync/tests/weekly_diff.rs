mod common;

use common::{setup_db, utc};

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde_json::json;

use squad_sync::schema::{player_snapshots, players};
use squad_sync::tz;
use squad_sync::weekly::{TRACKED_FIELDS, weekly_diffs};

fn insert_player(conn: &mut SqliteConnection, external_id: i64, name: &str) -> i32 {
    let now = tz::to_rfc3339_millis(Utc::now());
    diesel::insert_into(players::table)
        .values((
            players::player_id.eq(external_id),
            players::team_id.eq(2001i64),
            players::name.eq(name),
            players::active.eq(true),
            players::created_at.eq(&now),
            players::updated_at.eq(&now),
        ))
        .returning(players::id)
        .get_result(conn)
        .unwrap()
}

fn insert_snapshot(
    conn: &mut SqliteConnection,
    player_row_id: i32,
    fetched_at: DateTime<Utc>,
    data: serde_json::Value,
) -> i32 {
    let snapshot_id: i32 = diesel::insert_into(player_snapshots::table)
        .values((
            player_snapshots::player_id.eq(player_row_id),
            player_snapshots::fetched_at.eq(tz::to_rfc3339_millis(fetched_at)),
            player_snapshots::data.eq(data.to_string()),
            player_snapshots::hash.eq("0000000000000000000000000000000000000000"),
        ))
        .returning(player_snapshots::id)
        .get_result(conn)
        .unwrap();
    diesel::update(players::table.find(player_row_id))
        .set(players::latest_snapshot_id.eq(Some(snapshot_id)))
        .execute(conn)
        .unwrap();
    snapshot_id
}

#[test]
fn deltas_compare_current_against_the_week_old_snapshot() {
    let (_db, mut conn) = setup_db();
    let now = utc(2026, 8, 5, 12);

    let karl = insert_player(&mut conn, 101, "Karl");
    insert_snapshot(
        &mut conn,
        karl,
        now - Duration::days(8),
        json!({"TSI": 12450, "PlayerForm": 6, "KeeperSkill": 14}),
    );
    let latest = insert_snapshot(
        &mut conn,
        karl,
        now - Duration::hours(1),
        json!({"TSI": 12600, "PlayerForm": 7, "KeeperSkill": 14}),
    );

    let diffs = weekly_diffs(&mut conn, &[101], now).expect("diffs");
    assert_eq!(diffs.len(), 1);
    let diff = &diffs[0];
    assert_eq!(diff.player_id, 101);
    assert_eq!(diff.snapshot_id, Some(latest));

    let tsi = &diff.changes["TSI"];
    assert_eq!(tsi.current, Some(12600.0));
    assert_eq!(tsi.previous, Some(12450.0));
    assert_eq!(tsi.delta, Some(150.0));

    assert_eq!(diff.changes["PlayerForm"].delta, Some(1.0));
    assert_eq!(diff.changes["KeeperSkill"].delta, Some(0.0));

    // Fields absent from both snapshots are null on all sides, and every
    // tracked field is present in the output.
    assert_eq!(diff.changes.len(), TRACKED_FIELDS.len());
    let scorer = &diff.changes["ScorerSkill"];
    assert_eq!(scorer.current, None);
    assert_eq!(scorer.previous, None);
    assert_eq!(scorer.delta, None);
}

#[test]
fn single_snapshot_falls_back_to_itself_with_zero_deltas() {
    let (_db, mut conn) = setup_db();
    let now = utc(2026, 8, 5, 12);

    let karl = insert_player(&mut conn, 101, "Karl");
    insert_snapshot(
        &mut conn,
        karl,
        now - Duration::hours(2),
        json!({"TSI": 12450, "PlayerForm": 6}),
    );

    let diffs = weekly_diffs(&mut conn, &[101], now).expect("diffs");
    let diff = &diffs[0];
    assert_eq!(diff.changes["TSI"].current, Some(12450.0));
    assert_eq!(diff.changes["TSI"].previous, Some(12450.0));
    assert_eq!(diff.changes["TSI"].delta, Some(0.0));
    assert_eq!(diff.changes["KeeperSkill"].delta, None);
}

#[test]
fn recent_only_history_falls_back_to_the_oldest_snapshot() {
    let (_db, mut conn) = setup_db();
    let now = utc(2026, 8, 5, 12);

    let karl = insert_player(&mut conn, 101, "Karl");
    // Three snapshots, none a week old yet.
    insert_snapshot(&mut conn, karl, now - Duration::days(3), json!({"TSI": 100}));
    insert_snapshot(&mut conn, karl, now - Duration::days(2), json!({"TSI": 110}));
    insert_snapshot(&mut conn, karl, now - Duration::days(1), json!({"TSI": 130}));

    let diffs = weekly_diffs(&mut conn, &[101], now).expect("diffs");
    let tsi = &diffs[0].changes["TSI"];
    assert_eq!(tsi.current, Some(130.0));
    assert_eq!(tsi.previous, Some(100.0));
    assert_eq!(tsi.delta, Some(30.0));
}

#[test]
fn non_numeric_values_yield_null_deltas() {
    let (_db, mut conn) = setup_db();
    let now = utc(2026, 8, 5, 12);

    let karl = insert_player(&mut conn, 101, "Karl");
    insert_snapshot(
        &mut conn,
        karl,
        now - Duration::days(8),
        json!({"TSI": "excellent"}),
    );
    insert_snapshot(&mut conn, karl, now - Duration::hours(1), json!({"TSI": 12600}));

    let diffs = weekly_diffs(&mut conn, &[101], now).expect("diffs");
    let tsi = &diffs[0].changes["TSI"];
    assert_eq!(tsi.current, Some(12600.0));
    assert_eq!(tsi.previous, None);
    assert_eq!(tsi.delta, None);
}

#[test]
fn players_without_snapshots_and_unknown_ids_resolve_to_null_maps() {
    let (_db, mut conn) = setup_db();
    let now = utc(2026, 8, 5, 12);
    insert_player(&mut conn, 101, "No Snapshot Yet");

    let diffs = weekly_diffs(&mut conn, &[101, 404], now).expect("diffs");
    assert_eq!(diffs.len(), 2);
    for diff in &diffs {
        assert_eq!(diff.snapshot_id, None);
        for (_, delta) in &diff.changes {
            assert_eq!(delta.current, None);
            assert_eq!(delta.delta, None);
        }
    }

    assert!(weekly_diffs(&mut conn, &[], now).expect("empty").is_empty());
}
