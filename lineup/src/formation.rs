//! Formation catalog and greedy slot assignment.
//!
//! A formation is an ordered list of position tokens (eleven or more slots;
//! tokens repeat, e.g. two Central Defender slots in a 4-4-2). Assignment is
//! greedy and strictly per-position: a player competes only for slots of
//! their own best position and is never substituted into another position's
//! slot, even when that slot would otherwise stay unfilled. Known
//! limitation, kept on purpose; a globally optimal matching would need
//! product sign-off first.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::score::Position;
use crate::score::Position::*;

/// A named lineup template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formation {
    /// Identifier used by the UI ("4-4-2").
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Required position per slot, in lineup order.
    pub positions: &'static [Position],
}

/// Built-in formations. All of them field wing backs and wingers.
pub const FORMATIONS: [Formation; 6] = [
    Formation {
        id: "4-4-2",
        name: "4-4-2",
        positions: &[
            Goalkeeper,
            CentralDefender,
            CentralDefender,
            WingBack,
            WingBack,
            InnerMidfielder,
            InnerMidfielder,
            Winger,
            Winger,
            Forward,
            Forward,
        ],
    },
    Formation {
        id: "3-5-2",
        name: "3-5-2",
        positions: &[
            Goalkeeper,
            CentralDefender,
            CentralDefender,
            CentralDefender,
            WingBack,
            WingBack,
            InnerMidfielder,
            InnerMidfielder,
            InnerMidfielder,
            Winger,
            Winger,
            Forward,
            Forward,
        ],
    },
    Formation {
        id: "4-3-3",
        name: "4-3-3",
        positions: &[
            Goalkeeper,
            CentralDefender,
            CentralDefender,
            WingBack,
            WingBack,
            InnerMidfielder,
            InnerMidfielder,
            InnerMidfielder,
            Winger,
            Winger,
            Forward,
            Forward,
            Forward,
        ],
    },
    Formation {
        id: "5-3-2",
        name: "5-3-2",
        positions: &[
            Goalkeeper,
            CentralDefender,
            CentralDefender,
            CentralDefender,
            WingBack,
            WingBack,
            InnerMidfielder,
            InnerMidfielder,
            InnerMidfielder,
            Winger,
            Winger,
            Forward,
            Forward,
        ],
    },
    Formation {
        id: "4-5-1",
        name: "4-5-1",
        positions: &[
            Goalkeeper,
            CentralDefender,
            CentralDefender,
            WingBack,
            WingBack,
            InnerMidfielder,
            InnerMidfielder,
            InnerMidfielder,
            Winger,
            Winger,
            Forward,
        ],
    },
    Formation {
        id: "3-4-3",
        name: "3-4-3",
        positions: &[
            Goalkeeper,
            CentralDefender,
            CentralDefender,
            CentralDefender,
            WingBack,
            WingBack,
            InnerMidfielder,
            InnerMidfielder,
            Winger,
            Winger,
            Forward,
            Forward,
            Forward,
        ],
    },
];

/// Look up a built-in formation by its id.
pub fn formation_by_id(id: &str) -> Option<&'static Formation> {
    FORMATIONS.iter().find(|f| f.id == id)
}

/// A player competing for a formation slot.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// External player id.
    pub player_id: i64,
    /// The player's computed (or overridden) best position.
    pub best_position: Option<Position>,
    /// Per-position scores, usually from [`crate::score::compute_scores`].
    pub scores: IndexMap<Position, f64>,
    /// True when the player already played an official match this period.
    pub has_played_this_period: bool,
}

/// Required slot count per distinct position of a formation.
pub fn position_counts(formation: &Formation) -> IndexMap<Position, usize> {
    let mut counts = IndexMap::new();
    for &position in formation.positions {
        *counts.entry(position).or_insert(0) += 1;
    }
    counts
}

/// Select the best available players for every slot of `formation`.
///
/// Per distinct position: candidates whose best position matches, who have
/// not played this period, and who carry a score for the position are
/// ranked by that score (stable sort, so equal scores keep their input
/// order) and the top N are taken, N being the position's slot count. The
/// result is the union of the selected external player ids.
pub fn select_for_formation(candidates: &[Candidate], formation: &Formation) -> BTreeSet<i64> {
    let mut selected = BTreeSet::new();

    for (position, needed) in position_counts(formation) {
        let mut eligible: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| {
                !c.has_played_this_period
                    && c.best_position == Some(position)
                    && c.scores.contains_key(&position)
            })
            .collect();
        eligible.sort_by(|a, b| {
            let a_score = a.scores.get(&position).copied().unwrap_or(0.0);
            let b_score = b.scores.get(&position).copied().unwrap_or(0.0);
            b_score
                .partial_cmp(&a_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for candidate in eligible.into_iter().take(needed) {
            selected.insert(candidate.player_id);
        }
    }

    selected
}

/// True when the candidate's best position appears anywhere in the formation.
pub fn matches_formation(candidate: &Candidate, formation: &Formation) -> bool {
    match candidate.best_position {
        Some(position) => formation.positions.contains(&position),
        None => false,
    }
}
