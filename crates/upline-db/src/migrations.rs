//! Schema versioning.
//!
//! The version lives in `PRAGMA user_version`. A fresh file gets the full
//! schema and its version stamp in one transaction; any version other than
//! zero or [`SCHEMA_VERSION`] is refused. The ledger tables are
//! append-only, so a future migration may add columns or tables but never
//! rewrite commission rows.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Bring the database to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    match current {
        0 => {
            tracing::info!(version = SCHEMA_VERSION, "initializing ledger schema");
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
        }
        SCHEMA_VERSION => {}
        other => {
            return Err(DbError::Migration(format!(
                "database schema v{other} is not supported (expected v{SCHEMA_VERSION})"
            )))
        }
    }
    Ok(())
}
