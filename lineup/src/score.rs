//! Per-position performance scoring.
//!
//! Scores are a weighted linear combination of a player's seven skills, each
//! boosted by loyalty, then scaled by form/experience/stamina factors. The
//! skill keys are the CHPP element names verbatim (`KeeperSkill`,
//! `PlayerForm`, ...), read straight out of a snapshot's raw attribute bag;
//! missing or non-numeric attributes count as zero, so an empty bag still
//! produces a fully populated (near-zero) score map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six positions a player is rated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Goalkeeper.
    #[serde(rename = "GK")]
    Goalkeeper,
    /// Central defender.
    #[serde(rename = "CD")]
    CentralDefender,
    /// Wing back.
    #[serde(rename = "WB")]
    WingBack,
    /// Inner midfielder.
    #[serde(rename = "IM")]
    InnerMidfielder,
    /// Winger.
    #[serde(rename = "WNG")]
    Winger,
    /// Forward.
    #[serde(rename = "FW")]
    Forward,
}

impl Position {
    /// Fixed iteration order. Ties in [`best_position`] resolve to the
    /// earliest entry, so this order is part of the scoring contract.
    pub const ORDER: [Position; 6] = [
        Position::Goalkeeper,
        Position::CentralDefender,
        Position::WingBack,
        Position::InnerMidfielder,
        Position::Winger,
        Position::Forward,
    ];

    /// Stable short code ("GK", "CD", ...).
    pub fn code(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::CentralDefender => "CD",
            Position::WingBack => "WB",
            Position::InnerMidfielder => "IM",
            Position::Winger => "WNG",
            Position::Forward => "FW",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::CentralDefender => "Central Defender",
            Position::WingBack => "Wing Back",
            Position::InnerMidfielder => "Inner Midfielder",
            Position::Winger => "Winger",
            Position::Forward => "Forward",
        }
    }

    /// Parse a short code back into a position.
    pub fn from_code(code: &str) -> Option<Position> {
        Position::ORDER.into_iter().find(|p| p.code() == code)
    }
}

/// Best-effort numeric read of a bag attribute; anything unreadable is 0.
fn numeric(bag: &Map<String, Value>, key: &str) -> f64 {
    match bag.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Compute the weighted performance score for every position.
///
/// Always returns all six positions, in [`Position::ORDER`]. The weight
/// tables sum to 1.0 per position; the final score is
/// `((0.8 * base) * formFactor + 0.2 * experienceFactor) * staminaFactor`.
pub fn compute_scores(bag: &Map<String, Value>) -> IndexMap<Position, f64> {
    let loyalty = numeric(bag, "Loyalty");
    let boosted = |key: &str| numeric(bag, key) + loyalty / 20.0;

    let keeper = boosted("KeeperSkill");
    let defender = boosted("DefenderSkill");
    let passing = boosted("PassingSkill");
    let playmaker = boosted("PlaymakerSkill");
    let winger = boosted("WingerSkill");
    let scorer = boosted("ScorerSkill");
    let set_pieces = boosted("SetPiecesSkill");

    let base = |position: Position| -> f64 {
        match position {
            Position::Goalkeeper => {
                0.85 * keeper + 0.05 * defender + 0.03 * passing + 0.05 * set_pieces
                    + 0.02 * playmaker
            }
            Position::CentralDefender => {
                0.70 * defender + 0.12 * passing + 0.08 * playmaker + 0.05 * set_pieces
                    + 0.05 * winger
            }
            Position::WingBack => {
                0.55 * defender + 0.20 * winger + 0.12 * passing + 0.07 * playmaker
                    + 0.03 * scorer
                    + 0.03 * set_pieces
            }
            Position::InnerMidfielder => {
                0.60 * playmaker + 0.15 * passing + 0.10 * defender + 0.05 * winger
                    + 0.05 * scorer
                    + 0.05 * set_pieces
            }
            Position::Winger => {
                0.55 * winger + 0.15 * passing + 0.10 * playmaker + 0.10 * scorer
                    + 0.07 * defender
                    + 0.03 * set_pieces
            }
            Position::Forward => {
                0.60 * scorer + 0.20 * passing + 0.07 * winger + 0.05 * playmaker
                    + 0.05 * set_pieces
                    + 0.03 * defender
            }
        }
    };

    let form_factor = 0.85 + 0.025 * numeric(bag, "PlayerForm");
    let experience_factor = 0.02 * numeric(bag, "Experience");
    let stamina_factor = 0.9 + 0.01 * numeric(bag, "StaminaSkill");

    Position::ORDER
        .into_iter()
        .map(|position| {
            let perf =
                ((0.8 * base(position)) * form_factor + 0.2 * experience_factor) * stamina_factor;
            (position, perf)
        })
        .collect()
}

/// Pick the position with the strictly greatest score.
///
/// Exact ties resolve to the position seen first in the map's iteration
/// order (for maps built by [`compute_scores`], that is [`Position::ORDER`]).
/// Returns `None` only for an empty map.
pub fn best_position(scores: &IndexMap<Position, f64>) -> Option<(Position, f64)> {
    let mut best: Option<(Position, f64)> = None;
    for (&position, &score) in scores {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((position, score)),
        }
    }
    best
}
