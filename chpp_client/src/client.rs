//! The CHPP HTTP client and response mapping.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::header;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ChppConfig;
use crate::models::{AvatarLayer, ChppAvatar, ChppMatch, ChppPlayer, MatchStatus, MatchType};
use crate::oauth;
use crate::xml::{self, XmlError};

const CHPP_URL: &str = "https://chpp.hattrick.org/chppxml.ashx";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised by CHPP fetches. All of them are fatal to a sync run.
#[derive(Debug, Error)]
pub enum ChppError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("CHPP request failed")]
    Http(#[from] reqwest::Error),
    /// CHPP answered with a non-success HTTP status.
    #[error("CHPP rejected the request: {0}")]
    Api(String),
    /// The response body was not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// The XML was well-formed but missing expected structure.
    #[error("unexpected CHPP response shape: {0}")]
    Shape(String),
}

/// OAuth-signed client for the three CHPP files this system consumes.
pub struct ChppClient {
    http: reqwest::Client,
    config: ChppConfig,
}

impl ChppClient {
    /// Build a client with the fixed request timeout applied.
    pub fn new(config: ChppConfig) -> Result<Self, ChppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// The configured team id.
    pub fn team_id(&self) -> i64 {
        self.config.team_id
    }

    async fn get_xml(&self, params: Vec<(String, String)>) -> Result<Value, ChppError> {
        let nonce: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let auth = oauth::authorization_header(
            &self.config,
            "GET",
            CHPP_URL,
            &params,
            &nonce,
            Utc::now().timestamp(),
        );

        if let Some((_, file)) = params.iter().find(|(k, _)| k == "file") {
            debug!(file = %file, "requesting CHPP file");
        }

        let response = self
            .http
            .get(CHPP_URL)
            .query(&params)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown CHPP error".to_string());
            return Err(ChppError::Api(format!("{status}: {body}")));
        }

        let body = response.text().await?;
        Ok(xml::xml_to_value(&body)?)
    }

    /// Fetch the configured team's current roster with full player details.
    pub async fn fetch_players(&self) -> Result<Vec<ChppPlayer>, ChppError> {
        let params = vec![
            ("file".to_string(), "players".to_string()),
            ("version".to_string(), "2.7".to_string()),
            ("teamID".to_string(), self.config.team_id.to_string()),
            ("includeMatchInfo".to_string(), "true".to_string()),
        ];
        let doc = self.get_xml(params).await?;
        parse_players(&doc, self.config.team_id)
    }

    /// Fetch the roster's avatar descriptions.
    pub async fn fetch_avatars(&self) -> Result<Vec<ChppAvatar>, ChppError> {
        let params = vec![
            ("file".to_string(), "avatars".to_string()),
            ("version".to_string(), "1.1".to_string()),
            ("teamId".to_string(), self.config.team_id.to_string()),
        ];
        let doc = self.get_xml(params).await?;
        parse_avatars(&doc)
    }

    /// Fetch the team's match list up to `last_match_date` (inclusive).
    pub async fn fetch_matches(
        &self,
        team_id: i64,
        last_match_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChppMatch>, ChppError> {
        let mut params = vec![
            ("file".to_string(), "matches".to_string()),
            ("version".to_string(), "2.9".to_string()),
            ("isYouth".to_string(), "false".to_string()),
            ("teamID".to_string(), team_id.to_string()),
        ];
        if let Some(last) = last_match_date {
            params.push((
                "LastMatchDate".to_string(),
                last.format("%Y-%m-%d %H:%M:%S").to_string(),
            ));
        }
        let doc = self.get_xml(params).await?;
        parse_matches(&doc, team_id)
    }
}

// ---- response mapping ------------------------------------------------------

pub(crate) fn parse_players(doc: &Value, fallback_team_id: i64) -> Result<Vec<ChppPlayer>, ChppError> {
    let data = doc.get("HattrickData");
    let team = data.and_then(|d| d.get("Team"));
    // PlayerList nests under Team in current responses, at the root in older ones.
    let player_list = team
        .and_then(|t| t.get("PlayerList"))
        .or_else(|| data.and_then(|d| d.get("PlayerList")));
    let team_id = team
        .and_then(|t| t.get("TeamID"))
        .and_then(value_i64)
        .unwrap_or(fallback_team_id);

    if player_list.is_none() {
        warn!(team_id, "missing PlayerList in CHPP players response");
    }

    let players_raw = element_list(player_list.and_then(|l| l.get("Player")));
    if players_raw.is_empty() {
        warn!(team_id, "no players returned by CHPP");
        return Ok(Vec::new());
    }

    let mut players = Vec::with_capacity(players_raw.len());
    for raw in players_raw {
        let Some(bag) = raw.as_object() else {
            return Err(ChppError::Shape("Player entry is not an element".into()));
        };
        let player_id = bag
            .get("PlayerID")
            .and_then(value_i64)
            .ok_or_else(|| ChppError::Shape("Player entry without PlayerID".into()))?;
        players.push(ChppPlayer {
            player_id,
            team_id: bag.get("TeamID").and_then(value_i64).unwrap_or(team_id),
            name: normalize_player_name(bag),
            raw: bag.clone(),
        });
    }
    Ok(players)
}

pub(crate) fn parse_avatars(doc: &Value) -> Result<Vec<ChppAvatar>, ChppError> {
    let players = doc
        .get("HattrickData")
        .and_then(|d| d.get("Team"))
        .and_then(|t| t.get("Players"))
        .and_then(|p| p.get("Player"));

    let mut avatars = Vec::new();
    for raw in element_list(players) {
        let Some(bag) = raw.as_object() else {
            continue;
        };
        let Some(player_id) = bag.get("PlayerID").and_then(value_i64) else {
            continue;
        };
        let Some(avatar) = bag.get("Avatar").and_then(Value::as_object) else {
            continue;
        };
        let background_image_url = avatar
            .get("BackgroundImage")
            .and_then(value_string)
            .unwrap_or_default();
        let layers = element_list(avatar.get("Layer"))
            .into_iter()
            .filter_map(|layer| {
                let layer = layer.as_object()?;
                Some(AvatarLayer {
                    image_url: layer.get("Image").and_then(value_string)?,
                    x: layer.get("x").and_then(value_i64).unwrap_or(0),
                    y: layer.get("y").and_then(value_i64).unwrap_or(0),
                })
            })
            .collect();
        avatars.push(ChppAvatar {
            player_id,
            background_image_url,
            layers,
        });
    }
    Ok(avatars)
}

pub(crate) fn parse_matches(doc: &Value, fallback_team_id: i64) -> Result<Vec<ChppMatch>, ChppError> {
    let data = doc.get("HattrickData");
    let team = data.and_then(|d| d.get("Team"));
    // MatchList sits inside Team, not directly under HattrickData.
    let match_list = team
        .and_then(|t| t.get("MatchList"))
        .or_else(|| data.and_then(|d| d.get("MatchList")));
    let team_id = team
        .and_then(|t| t.get("TeamID"))
        .and_then(value_i64)
        .unwrap_or(fallback_team_id);

    if match_list.is_none() {
        warn!(team_id, "missing MatchList in CHPP matches response");
    }

    let matches_raw = element_list(match_list.and_then(|l| l.get("Match")));
    if matches_raw.is_empty() {
        warn!(team_id, "no matches returned by CHPP");
        return Ok(Vec::new());
    }

    let mut matches = Vec::with_capacity(matches_raw.len());
    for raw in matches_raw {
        let Some(bag) = raw.as_object() else {
            return Err(ChppError::Shape("Match entry is not an element".into()));
        };
        let match_id = bag
            .get("MatchID")
            .and_then(value_i64)
            .ok_or_else(|| ChppError::Shape("Match entry without MatchID".into()))?;
        let match_date = bag
            .get("MatchDate")
            .and_then(|v| v.as_str())
            .and_then(parse_chpp_datetime)
            .ok_or_else(|| {
                ChppError::Shape(format!("match {match_id} has an unreadable MatchDate"))
            })?;

        let home = bag.get("HomeTeam").and_then(Value::as_object);
        let away = bag.get("AwayTeam").and_then(Value::as_object);

        matches.push(ChppMatch {
            match_id,
            team_id,
            match_date,
            home_team_id: nested_i64(home, "HomeTeamID"),
            home_team_name: nested_string(home, "HomeTeamName"),
            home_team_short_name: home.and_then(|h| h.get("HomeTeamShortName")).and_then(value_string),
            away_team_id: nested_i64(away, "AwayTeamID"),
            away_team_name: nested_string(away, "AwayTeamName"),
            away_team_short_name: away.and_then(|a| a.get("AwayTeamShortName")).and_then(value_string),
            home_goals: bag.get("HomeGoals").and_then(value_i64).unwrap_or(0) as i32,
            away_goals: bag.get("AwayGoals").and_then(value_i64).unwrap_or(0) as i32,
            status: MatchStatus::parse(
                bag.get("Status").and_then(|v| v.as_str()).unwrap_or("UPCOMING"),
            ),
            match_type: MatchType::from_chpp_code(
                bag.get("MatchType").and_then(value_i64).unwrap_or(4),
            ),
            match_context_id: bag.get("MatchContextId").and_then(value_i64).unwrap_or(0),
            cup_level: bag
                .get("CupLevel")
                .and_then(value_i64)
                .filter(|v| *v != 0)
                .map(|v| v as i32),
            cup_level_index: bag
                .get("CupLevelIndex")
                .and_then(value_i64)
                .filter(|v| *v != 0)
                .map(|v| v as i32),
            source_system: bag
                .get("SourceSystem")
                .and_then(value_string)
                .filter(|s| !s.is_empty()),
            orders_given: bag.get("OrdersGiven").and_then(value_bool),
        });
    }
    Ok(matches)
}

/// Display name from first/nick/last, skipping empty parts.
fn normalize_player_name(bag: &Map<String, Value>) -> String {
    ["FirstName", "NickName", "LastName"]
        .iter()
        .filter_map(|key| bag.get(*key).and_then(value_string))
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// CHPP list elements arrive as a missing key, a single object, or an array.
fn element_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

fn value_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_uppercase().as_str() {
            "TRUE" | "1" => Some(true),
            "FALSE" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn nested_i64(parent: Option<&Map<String, Value>>, key: &str) -> i64 {
    parent.and_then(|p| p.get(key)).and_then(value_i64).unwrap_or(0)
}

fn nested_string(parent: Option<&Map<String, Value>>, key: &str) -> String {
    parent
        .and_then(|p| p.get(key))
        .and_then(value_string)
        .unwrap_or_default()
}

/// CHPP timestamps are naive `"YYYY-MM-DD HH:MM:SS"` strings, treated as UTC.
fn parse_chpp_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
