//! Typed records produced by the CHPP feed.
//!
//! Player records deliberately keep the full attribute bag opaque: CHPP's
//! player schema is large and shifts between API versions, so only the
//! identity fields are lifted out and the rest flows through as-is for the
//! snapshot/diff pipeline.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One player as returned by `file=players`.
#[derive(Debug, Clone)]
pub struct ChppPlayer {
    /// Hattrick's global player id.
    pub player_id: i64,
    /// Owning team id.
    pub team_id: i64,
    /// Display name assembled from first/nick/last name.
    pub name: String,
    /// The full raw attribute bag, element names verbatim.
    pub raw: Map<String, Value>,
}

/// One layer of a player avatar (an image positioned on the card).
#[derive(Debug, Clone)]
pub struct AvatarLayer {
    /// Image URL (relative to Hattrick's CDN root).
    pub image_url: String,
    /// Horizontal offset in pixels.
    pub x: i64,
    /// Vertical offset in pixels.
    pub y: i64,
}

/// One player avatar as returned by `file=avatars`. Purely cosmetic.
#[derive(Debug, Clone)]
pub struct ChppAvatar {
    /// Hattrick's global player id.
    pub player_id: i64,
    /// Background image URL.
    pub background_image_url: String,
    /// Layers to composite over the background, bottom-up.
    pub layers: Vec<AvatarLayer>,
}

/// Match progress as reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Full-time, result is final.
    Finished,
    /// Currently being played.
    Ongoing,
    /// Scheduled for the future.
    Upcoming,
}

impl MatchStatus {
    /// Stable storage/API form.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Ongoing => "ONGOING",
            MatchStatus::Upcoming => "UPCOMING",
        }
    }

    /// Parse a feed/storage value; anything unknown reads as upcoming.
    pub fn parse(value: &str) -> MatchStatus {
        match value.to_uppercase().as_str() {
            "FINISHED" => MatchStatus::Finished,
            "ONGOING" => MatchStatus::Ongoing,
            _ => MatchStatus::Upcoming,
        }
    }
}

/// Match category, mapped from CHPP's numeric MatchType codes 1-11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    League,
    Qualification,
    Cup,
    Friendly,
    HattrickMasters,
    WorldCup,
    U20WorldCup,
    Ladder,
    Tournament,
    Single,
    Preparation,
}

impl MatchType {
    /// Map a CHPP MatchType code; unknown codes fall back to friendly.
    pub fn from_chpp_code(code: i64) -> MatchType {
        match code {
            1 => MatchType::League,
            2 => MatchType::Qualification,
            3 => MatchType::Cup,
            4 => MatchType::Friendly,
            5 => MatchType::HattrickMasters,
            6 => MatchType::WorldCup,
            7 => MatchType::U20WorldCup,
            8 => MatchType::Ladder,
            9 => MatchType::Tournament,
            10 => MatchType::Single,
            11 => MatchType::Preparation,
            _ => MatchType::Friendly,
        }
    }

    /// Stable storage/API form.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::League => "LEAGUE",
            MatchType::Qualification => "QUALIFICATION",
            MatchType::Cup => "CUP",
            MatchType::Friendly => "FRIENDLY",
            MatchType::HattrickMasters => "HATTRICK_MASTERS",
            MatchType::WorldCup => "WORLD_CUP",
            MatchType::U20WorldCup => "U20_WORLD_CUP",
            MatchType::Ladder => "LADDER",
            MatchType::Tournament => "TOURNAMENT",
            MatchType::Single => "SINGLE",
            MatchType::Preparation => "PREPARATION",
        }
    }

    /// Parse a stored form back into the enum.
    pub fn parse(value: &str) -> Option<MatchType> {
        [
            MatchType::League,
            MatchType::Qualification,
            MatchType::Cup,
            MatchType::Friendly,
            MatchType::HattrickMasters,
            MatchType::WorldCup,
            MatchType::U20WorldCup,
            MatchType::Ladder,
            MatchType::Tournament,
            MatchType::Single,
            MatchType::Preparation,
        ]
        .into_iter()
        .find(|t| t.as_str() == value)
    }
}

/// One match as returned by `file=matches`.
#[derive(Debug, Clone)]
pub struct ChppMatch {
    /// Hattrick's global match id.
    pub match_id: i64,
    /// The tracked team's id.
    pub team_id: i64,
    /// Kick-off time.
    pub match_date: DateTime<Utc>,
    /// Home side id.
    pub home_team_id: i64,
    /// Home side name.
    pub home_team_name: String,
    /// Home side short name, when the feed provides one.
    pub home_team_short_name: Option<String>,
    /// Away side id.
    pub away_team_id: i64,
    /// Away side name.
    pub away_team_name: String,
    /// Away side short name, when the feed provides one.
    pub away_team_short_name: Option<String>,
    /// Home goals (0 until the match produces a score).
    pub home_goals: i32,
    /// Away goals (0 until the match produces a score).
    pub away_goals: i32,
    /// Progress state.
    pub status: MatchStatus,
    /// Match category.
    pub match_type: MatchType,
    /// Series/cup context id.
    pub match_context_id: i64,
    /// Cup round, for cup matches.
    pub cup_level: Option<i32>,
    /// Cup round index, for cup matches.
    pub cup_level_index: Option<i32>,
    /// Originating system tag ("Hattrick", "HTOIntegrated", ...).
    pub source_system: Option<String>,
    /// Whether lineup orders have been submitted for this match.
    pub orders_given: Option<bool>,
}
