//! Versioned SQLite schema.
//!
//! `MIGRATIONS[i]` moves the schema from version `i` to `i + 1`. Applied
//! versions are recorded in `schema_migrations`; a database written by a
//! newer build is refused rather than guessed at.

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};

/// Ordered schema steps; the last index + 1 is the current version.
const MIGRATIONS: &[&str] = &[
    // v1: one row per (entry, group) copy; rows are deactivated, never deleted.
    r#"
    CREATE TABLE shares (
        share_id BLOB PRIMARY KEY,        -- 16 bytes
        entry_id BLOB NOT NULL,           -- 16 bytes
        group_id BLOB NOT NULL,           -- 16 bytes
        shared_by BLOB NOT NULL,          -- 16 bytes, entry owner
        encrypted_data BLOB NOT NULL,     -- ciphertext incl. auth tag
        iv BLOB NOT NULL,
        title TEXT NOT NULL,              -- cached plaintext metadata
        category TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1,
        updated_by BLOB,                  -- null until the first edit
        updated_at INTEGER NOT NULL,      -- Unix ms
        created_at INTEGER NOT NULL,      -- Unix ms
        is_active INTEGER NOT NULL DEFAULT 1
    );

    -- At most one active share per (entry, group)
    CREATE UNIQUE INDEX idx_shares_active_pair
        ON shares(entry_id, group_id) WHERE is_active = 1;

    CREATE INDEX idx_shares_entry ON shares(entry_id, is_active);
    CREATE INDEX idx_shares_group ON shares(group_id, is_active);
    "#,
];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring `conn` up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;

    let applied: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema version {} is newer than this build ({})",
            applied, CURRENT_VERSION
        )));
    }
    if applied == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (idx, sql) in MIGRATIONS.iter().enumerate().skip(applied as usize) {
        let version = idx as u32 + 1;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, crate::sqlite::now_millis()],
        )?;
        tracing::debug!(version, "applied schema migration");
    }
    tx.commit()?;

    Ok(())
}
