mod common;

use common::{FakeFeed, chpp_player, count, setup_db};

use diesel::prelude::*;
use serde_json::json;

use chpp_client::models::{AvatarLayer, ChppAvatar};
use squad_sync::models::{Player, PlayerChange, PlayerSnapshot, SyncRun};
use squad_sync::schema::{player_changes, player_snapshots, players, sync_runs};
use squad_sync::sync::run_player_sync;

const TEAM: i64 = 2001;

fn roster_feed() -> FakeFeed {
    FakeFeed {
        players: vec![
            chpp_player(
                101,
                TEAM,
                "Karl Svensson",
                json!({"PlayerID": 101, "TSI": 12450, "PlayerForm": 6, "KeeperSkill": 14}),
            ),
            chpp_player(
                102,
                TEAM,
                "Jo Jojo Berg",
                json!({"PlayerID": 102, "TSI": 800, "PlayerForm": 5, "ScorerSkill": 9}),
            ),
        ],
        ..FakeFeed::default()
    }
}

fn load_player(conn: &mut SqliteConnection, external_id: i64) -> Player {
    players::table
        .filter(players::player_id.eq(external_id))
        .select(Player::as_select())
        .first(conn)
        .unwrap()
}

#[tokio::test]
async fn first_sync_creates_players_with_baseline_snapshots() {
    let (_db, mut conn) = setup_db();
    let feed = roster_feed();

    let summary = run_player_sync(&mut conn, &feed, TEAM).await.expect("sync");

    assert_eq!(summary.total_players, 2);
    assert_eq!(summary.players_created, 2);
    assert_eq!(summary.players_updated, 0);
    // First-ever snapshots are baselines, not "every field changed".
    assert_eq!(summary.total_changes, 0);

    assert_eq!(count(&mut conn, "players"), 2);
    assert_eq!(count(&mut conn, "player_snapshots"), 2);
    assert_eq!(count(&mut conn, "player_changes"), 0);

    let karl = load_player(&mut conn, 101);
    assert!(karl.active);
    let snapshot_id = karl.latest_snapshot_id.expect("latest pointer set");
    let snapshot: PlayerSnapshot = player_snapshots::table
        .find(snapshot_id)
        .select(PlayerSnapshot::as_select())
        .first(&mut conn)
        .unwrap();
    assert_eq!(snapshot.player_id, karl.id);
    assert_eq!(snapshot.hash.len(), 40);
    assert!(snapshot.data.contains("\"TSI\":12450"));

    let run: SyncRun = sync_runs::table
        .find(summary.sync_run_id)
        .select(SyncRun::as_select())
        .first(&mut conn)
        .unwrap();
    assert_eq!(run.status, "SUCCESS");
    assert_eq!(run.changes_count, 0);
    assert!(run.completed_at.is_some());
}

#[tokio::test]
async fn unchanged_feed_is_a_fast_path_no_op() {
    let (_db, mut conn) = setup_db();
    let feed = roster_feed();

    run_player_sync(&mut conn, &feed, TEAM).await.expect("first");
    let second = run_player_sync(&mut conn, &feed, TEAM).await.expect("second");

    assert_eq!(second.players_created, 0);
    assert_eq!(second.players_updated, 0);
    assert_eq!(second.total_changes, 0);
    // No new snapshots, no change rows; both runs recorded.
    assert_eq!(count(&mut conn, "player_snapshots"), 2);
    assert_eq!(count(&mut conn, "player_changes"), 0);
    assert_eq!(count(&mut conn, "sync_runs"), 2);
}

#[tokio::test]
async fn changed_fields_produce_snapshot_and_change_rows() {
    let (_db, mut conn) = setup_db();
    run_player_sync(&mut conn, &roster_feed(), TEAM)
        .await
        .expect("first");

    let mut changed = roster_feed();
    changed.players[0] = chpp_player(
        101,
        TEAM,
        "Karl Svensson",
        json!({"PlayerID": 101, "TSI": 12600, "PlayerForm": 6, "KeeperSkill": 14}),
    );
    let summary = run_player_sync(&mut conn, &changed, TEAM)
        .await
        .expect("second");

    assert_eq!(summary.players_created, 0);
    assert_eq!(summary.players_updated, 1);
    assert_eq!(summary.total_changes, 1);
    assert_eq!(count(&mut conn, "player_snapshots"), 3);

    let changes: Vec<PlayerChange> = player_changes::table
        .select(PlayerChange::as_select())
        .load(&mut conn)
        .unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field_name, "TSI");
    assert_eq!(changes[0].old_value.as_deref(), Some("12450"));
    assert_eq!(changes[0].new_value.as_deref(), Some("12600"));

    // The latest pointer moved to the new snapshot, and the change row
    // references exactly that snapshot.
    let karl = load_player(&mut conn, 101);
    assert_eq!(karl.latest_snapshot_id, Some(changes[0].snapshot_id));
}

#[tokio::test]
async fn players_missing_from_the_feed_are_deactivated_and_revived() {
    let (_db, mut conn) = setup_db();
    let mut feed = roster_feed();
    feed.players.push(chpp_player(
        103,
        TEAM,
        "Short Stay",
        json!({"PlayerID": 103, "TSI": 50}),
    ));
    run_player_sync(&mut conn, &feed, TEAM).await.expect("first");

    // 103 vanishes from the roster.
    run_player_sync(&mut conn, &roster_feed(), TEAM)
        .await
        .expect("second");
    assert!(!load_player(&mut conn, 103).active);
    assert!(load_player(&mut conn, 101).active);
    assert!(load_player(&mut conn, 102).active);
    // Soft delete: the row and its history stay.
    assert_eq!(count(&mut conn, "players"), 3);

    // 103 reappears and is reactivated by the upsert.
    run_player_sync(&mut conn, &feed, TEAM).await.expect("third");
    assert!(load_player(&mut conn, 103).active);
}

#[tokio::test]
async fn empty_roster_response_deactivates_nobody() {
    let (_db, mut conn) = setup_db();
    run_player_sync(&mut conn, &roster_feed(), TEAM)
        .await
        .expect("first");

    let empty = FakeFeed::default();
    let summary = run_player_sync(&mut conn, &empty, TEAM)
        .await
        .expect("empty feed run");
    assert_eq!(summary.total_players, 0);

    // The guard: a feed hiccup must not wipe the roster.
    assert!(load_player(&mut conn, 101).active);
    assert!(load_player(&mut conn, 102).active);
}

#[tokio::test]
async fn feed_failure_marks_the_run_failed_and_propagates() {
    let (_db, mut conn) = setup_db();
    let feed = FakeFeed {
        fail_players: true,
        ..FakeFeed::default()
    };

    let err = run_player_sync(&mut conn, &feed, TEAM)
        .await
        .expect_err("must fail");
    assert!(format!("{err:#}").contains("CHPP"));

    let runs: Vec<SyncRun> = sync_runs::table
        .select(SyncRun::as_select())
        .load(&mut conn)
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "FAILED");
    assert!(runs[0].completed_at.is_some());
    assert!(
        runs[0]
            .message
            .as_deref()
            .unwrap()
            .contains("fetching CHPP players")
    );
    assert_eq!(count(&mut conn, "players"), 0);
}

#[tokio::test]
async fn avatars_merge_into_the_snapshot_bag() {
    let (_db, mut conn) = setup_db();
    let mut feed = roster_feed();
    feed.avatars = vec![ChppAvatar {
        player_id: 101,
        background_image_url: "/bg.png".to_string(),
        layers: vec![AvatarLayer {
            image_url: "/kit.png".to_string(),
            x: 10,
            y: 20,
        }],
    }];

    run_player_sync(&mut conn, &feed, TEAM).await.expect("sync");

    let karl = load_player(&mut conn, 101);
    let snapshot: PlayerSnapshot = player_snapshots::table
        .find(karl.latest_snapshot_id.unwrap())
        .select(PlayerSnapshot::as_select())
        .first(&mut conn)
        .unwrap();
    let bag: serde_json::Value = serde_json::from_str(&snapshot.data).unwrap();
    assert_eq!(bag["Avatar"]["BackgroundImage"], "/bg.png");
    assert_eq!(bag["Avatar"]["Layers"][0]["Image"], "/kit.png");

    // A player without an avatar keeps a bag without the key.
    let jo = load_player(&mut conn, 102);
    let snapshot: PlayerSnapshot = player_snapshots::table
        .find(jo.latest_snapshot_id.unwrap())
        .select(PlayerSnapshot::as_select())
        .first(&mut conn)
        .unwrap();
    assert!(!snapshot.data.contains("Avatar"));
}

#[tokio::test]
async fn renamed_player_updates_name_without_touching_identity() {
    let (_db, mut conn) = setup_db();
    run_player_sync(&mut conn, &roster_feed(), TEAM)
        .await
        .expect("first");

    let mut renamed = roster_feed();
    renamed.players[0].name = "Karl 'The Wall' Svensson".to_string();
    run_player_sync(&mut conn, &renamed, TEAM)
        .await
        .expect("second");

    let karl = load_player(&mut conn, 101);
    assert_eq!(karl.name, "Karl 'The Wall' Svensson");
    assert_eq!(count(&mut conn, "players"), 2);
}
