//! SQLite connection helper.
//!
//! Opens a connection and applies the PRAGMAs the rest of the crate assumes:
//! WAL journaling, foreign_keys=ON, and a 5000ms busy_timeout. The connection
//! is constructed once at process start and passed explicitly to everything
//! that needs it; there is no ambient global handle.

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}
