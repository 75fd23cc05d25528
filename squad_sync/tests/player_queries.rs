mod common;

use common::{FakeFeed, chpp_player, setup_db};

use chrono::Utc;
use serde_json::json;

use squad_sync::players::{find_player_with_history, list_players};
use squad_sync::sync::run_player_sync;

const TEAM: i64 = 2001;

async fn seed_roster_with_one_change(conn: &mut diesel::SqliteConnection) {
    let feed = FakeFeed {
        players: vec![
            chpp_player(
                101,
                TEAM,
                "Karl Svensson",
                json!({"PlayerID": 101, "TSI": 12450, "PlayerForm": 6}),
            ),
            chpp_player(102, TEAM, "Jo Berg", json!({"PlayerID": 102, "TSI": 800})),
        ],
        ..FakeFeed::default()
    };
    run_player_sync(conn, &feed, TEAM).await.expect("first sync");

    let changed = FakeFeed {
        players: vec![
            chpp_player(
                101,
                TEAM,
                "Karl Svensson",
                json!({"PlayerID": 101, "TSI": 12600, "PlayerForm": 6}),
            ),
            chpp_player(102, TEAM, "Jo Berg", json!({"PlayerID": 102, "TSI": 800})),
        ],
        ..FakeFeed::default()
    };
    run_player_sync(conn, &changed, TEAM)
        .await
        .expect("second sync");
}

#[tokio::test]
async fn roster_listing_attaches_snapshot_changes_and_weekly_diff() {
    let (_db, mut conn) = setup_db();
    seed_roster_with_one_change(&mut conn).await;

    let roster = list_players(&mut conn, 5, Utc::now()).expect("list");
    assert_eq!(roster.len(), 2);
    // Ordered by external player id.
    assert_eq!(roster[0].player_id, 101);
    assert_eq!(roster[1].player_id, 102);

    let karl = &roster[0];
    let snapshot = karl.latest_snapshot.as_ref().expect("latest snapshot");
    assert_eq!(snapshot.data["TSI"], 12600);

    assert_eq!(karl.recent_changes.len(), 1);
    assert_eq!(karl.recent_changes[0].field_name, "TSI");
    assert_eq!(karl.recent_changes[0].old_value.as_deref(), Some("12450"));

    // Both snapshots are minutes apart, so the weekly diff falls back to the
    // oldest one: the TSI delta is visible.
    let weekly = karl.weekly_diff.as_ref().expect("weekly diff");
    assert_eq!(weekly["TSI"].delta, Some(150.0));

    // The unchanged player carries an empty change list but still gets a
    // fully populated weekly map.
    let jo = &roster[1];
    assert!(jo.recent_changes.is_empty());
    assert_eq!(jo.weekly_diff.as_ref().unwrap()["TSI"].delta, Some(0.0));
}

#[tokio::test]
async fn single_player_history_is_complete() {
    let (_db, mut conn) = setup_db();
    seed_roster_with_one_change(&mut conn).await;

    let karl = find_player_with_history(&mut conn, 101, Utc::now())
        .expect("query")
        .expect("found");
    assert_eq!(karl.name, "Karl Svensson");
    assert_eq!(karl.changes.len(), 1);
    assert!(karl.latest_snapshot.is_some());
    assert!(karl.weekly_diff.is_some());

    let missing = find_player_with_history(&mut conn, 424242, Utc::now()).expect("query");
    assert!(missing.is_none());
}
