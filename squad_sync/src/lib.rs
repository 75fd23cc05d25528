//! Squad synchronization engine for a Hattrick team dashboard.
//!
//! Pulls the roster and match list from the CHPP feed, persists immutable
//! player snapshots with a field-level change history, and serves the read
//! models the dashboard UI consumes. Storage is SQLite via diesel with
//! embedded migrations; all timestamps are RFC3339 UTC text.

#![deny(missing_docs)]

pub mod db;
pub mod matches;
pub mod models;
pub mod players;
#[allow(missing_docs)]
pub mod schema;
pub mod sync;
pub mod tz;
pub mod weekly;
