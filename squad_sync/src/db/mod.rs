//! Database plumbing: connection helper and embedded migrations.

pub mod connection;
pub mod migrate;
