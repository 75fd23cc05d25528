//! Pure lineup analytics for a Hattrick squad.
//!
//! Everything in this crate is a stateless function over a player's raw
//! attribute bag (the key->value JSON object captured by the sync engine):
//! - [`score`]: weighted per-position performance scores and best-position
//!   selection.
//! - [`formation`]: formation catalog and greedy best-fit assignment of
//!   players to formation slots.
//! - [`match_week`]: the canonical "match week" boundary (last Friday, UTC)
//!   and the played-this-period check derived from it.
//!
//! No I/O, no storage; safe to call concurrently from any number of read
//! requests.

pub mod formation;
pub mod match_week;
pub mod score;
