//! Embedded migrations runner.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Diesel migrations bundled with this crate; applied by [`run_sqlite`].
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run pending migrations against the SQLite database at `database_url`.
///
/// Switches the database to WAL first so later connections inherit it.
pub fn run_sqlite(database_url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;

    Ok(())
}
