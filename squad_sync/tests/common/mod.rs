#![allow(dead_code)]

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use tempfile::TempDir;

use chpp_client::models::{ChppAvatar, ChppMatch, ChppPlayer, MatchStatus, MatchType};
use chpp_client::{ChppError, ChppFeed};
use squad_sync::db::{connection, migrate};

pub struct TestDb {
    _dir: TempDir, // keep alive for the life of the test
    pub path: String,
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");
    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result::<CountRow>(conn)
        .unwrap()
        .n
}

/// In-memory stand-in for the CHPP API.
#[derive(Default)]
pub struct FakeFeed {
    pub players: Vec<ChppPlayer>,
    pub avatars: Vec<ChppAvatar>,
    pub matches: Vec<ChppMatch>,
    pub fail_players: bool,
}

#[async_trait]
impl ChppFeed for FakeFeed {
    async fn fetch_players(&self) -> Result<Vec<ChppPlayer>, ChppError> {
        if self.fail_players {
            return Err(ChppError::Api("503: CHPP maintenance".to_string()));
        }
        Ok(self.players.clone())
    }

    async fn fetch_avatars(&self) -> Result<Vec<ChppAvatar>, ChppError> {
        Ok(self.avatars.clone())
    }

    async fn fetch_matches(
        &self,
        _team_id: i64,
        _last_match_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChppMatch>, ChppError> {
        Ok(self.matches.clone())
    }
}

pub fn chpp_player(player_id: i64, team_id: i64, name: &str, raw: serde_json::Value) -> ChppPlayer {
    ChppPlayer {
        player_id,
        team_id,
        name: name.to_string(),
        raw: raw.as_object().cloned().expect("raw bag must be an object"),
    }
}

pub fn league_match(match_id: i64, team_id: i64, date: DateTime<Utc>) -> ChppMatch {
    ChppMatch {
        match_id,
        team_id,
        match_date: date,
        home_team_id: team_id,
        home_team_name: "Home FC".to_string(),
        home_team_short_name: Some("HFC".to_string()),
        away_team_id: 3002,
        away_team_name: "Away IF".to_string(),
        away_team_short_name: None,
        home_goals: 0,
        away_goals: 0,
        status: MatchStatus::Upcoming,
        match_type: MatchType::League,
        match_context_id: 42,
        cup_level: None,
        cup_level_index: None,
        source_system: Some("Hattrick".to_string()),
        orders_given: None,
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}
