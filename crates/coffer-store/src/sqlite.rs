//! SQLite implementation of the ShareStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use coffer_core::{EntryId, GroupId, NewShare, Sealed, Share, ShareId, ShareUpdate, UserId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertResult, ShareStore};

const SHARE_COLUMNS: &str = "share_id, entry_id, group_id, shared_by, encrypted_data, iv, \
     title, category, version, updated_by, updated_at, created_at, is_active";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

fn column_error(row: &Row<'_>, name: &str) -> rusqlite::Error {
    let idx = row.as_ref().column_index(name).unwrap_or(0);
    rusqlite::Error::InvalidColumnType(idx, name.into(), rusqlite::types::Type::Blob)
}

fn blob_id<T>(row: &Row<'_>, name: &str) -> rusqlite::Result<T>
where
    T: for<'a> TryFrom<&'a [u8]>,
{
    let bytes: Vec<u8> = row.get(name)?;
    T::try_from(bytes.as_slice()).map_err(|_| column_error(row, name))
}

// Helper to convert a row to Share
fn row_to_share(row: &Row<'_>) -> rusqlite::Result<Share> {
    let updated_by: Option<Vec<u8>> = row.get("updated_by")?;
    let updated_by = updated_by
        .map(|bytes| UserId::try_from(bytes.as_slice()).map_err(|_| column_error(row, "updated_by")))
        .transpose()?;

    let version: i64 = row.get("version")?;
    let version = u64::try_from(version).map_err(|_| {
        let idx = row.as_ref().column_index("version").unwrap_or(0);
        rusqlite::Error::IntegralValueOutOfRange(idx, version)
    })?;

    Ok(Share {
        id: blob_id(row, "share_id")?,
        entry_id: blob_id(row, "entry_id")?,
        group_id: blob_id(row, "group_id")?,
        shared_by: blob_id(row, "shared_by")?,
        sealed: Sealed {
            ciphertext: row.get("encrypted_data")?,
            iv: row.get("iv")?,
        },
        title: row.get("title")?,
        category: row.get("category")?,
        version,
        updated_by,
        updated_at: row.get("updated_at")?,
        created_at: row.get("created_at")?,
        is_active: row.get("is_active")?,
    })
}

#[async_trait]
impl ShareStore for SqliteStore {
    async fn insert_share(&self, share: &NewShare, now: i64) -> Result<InsertResult> {
        let share = share.clone();

        self.run(move |conn| {
            let tx = conn.transaction()?;

            // Check for an active share of the same pair
            let existing: Option<Vec<u8>> = tx
                .query_row(
                    "SELECT share_id FROM shares
                     WHERE entry_id = ?1 AND group_id = ?2 AND is_active = 1",
                    params![
                        share.entry_id.as_bytes().as_slice(),
                        share.group_id.as_bytes().as_slice()
                    ],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(bytes) = existing {
                let existing = ShareId::try_from(bytes.as_slice())
                    .map_err(|_| StoreError::InvalidData("malformed share_id".into()))?;
                return Ok(InsertResult::AlreadyActive { existing });
            }

            let stored = share.into_share(now);
            tx.execute(
                "INSERT INTO shares (
                    share_id, entry_id, group_id, shared_by, encrypted_data, iv,
                    title, category, version, updated_by, updated_at, created_at, is_active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    stored.id.as_bytes().as_slice(),
                    stored.entry_id.as_bytes().as_slice(),
                    stored.group_id.as_bytes().as_slice(),
                    stored.shared_by.as_bytes().as_slice(),
                    stored.sealed.ciphertext.as_slice(),
                    stored.sealed.iv.as_slice(),
                    stored.title,
                    stored.category,
                    stored.version as i64,
                    stored.updated_by.as_ref().map(|u| u.as_bytes().as_slice()),
                    stored.updated_at,
                    stored.created_at,
                    stored.is_active,
                ],
            )?;
            tx.commit()?;

            Ok(InsertResult::Inserted(stored))
        })
        .await
    }

    async fn deactivate_share(&self, id: &ShareId, actor: &UserId, now: i64) -> Result<bool> {
        let id = *id;
        let actor = *actor;

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let active: Option<bool> = tx
                .query_row(
                    "SELECT is_active FROM shares WHERE share_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            match active {
                None => Err(StoreError::NotFound(id.to_string())),
                Some(false) => Ok(false),
                Some(true) => {
                    tx.execute(
                        "UPDATE shares SET is_active = 0, updated_by = ?2, updated_at = ?3
                         WHERE share_id = ?1",
                        params![id.as_bytes().as_slice(), actor.as_bytes().as_slice(), now],
                    )?;
                    tx.commit()?;
                    Ok(true)
                }
            }
        })
        .await
    }

    async fn get_share(&self, id: &ShareId) -> Result<Option<Share>> {
        let id = *id;

        self.run(move |conn| {
            let share = conn
                .query_row(
                    &format!("SELECT {} FROM shares WHERE share_id = ?1", SHARE_COLUMNS),
                    params![id.as_bytes().as_slice()],
                    row_to_share,
                )
                .optional()?;
            Ok(share)
        })
        .await
    }

    async fn fetch_active_shares(&self, entry_id: &EntryId) -> Result<Vec<Share>> {
        let entry_id = *entry_id;

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM shares WHERE entry_id = ?1 AND is_active = 1
                 ORDER BY created_at, rowid",
                SHARE_COLUMNS
            ))?;
            let shares = stmt
                .query_map(params![entry_id.as_bytes().as_slice()], row_to_share)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(shares)
        })
        .await
    }

    async fn count_active_shares(&self, entry_id: &EntryId) -> Result<u64> {
        let entry_id = *entry_id;

        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM shares WHERE entry_id = ?1 AND is_active = 1",
                params![entry_id.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            u64::try_from(count).map_err(|_| StoreError::InvalidData(format!("count {}", count)))
        })
        .await
    }

    async fn fetch_group_shares(&self, group_id: &GroupId) -> Result<Vec<Share>> {
        let group_id = *group_id;

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM shares WHERE group_id = ?1 AND is_active = 1
                 ORDER BY created_at, rowid",
                SHARE_COLUMNS
            ))?;
            let shares = stmt
                .query_map(params![group_id.as_bytes().as_slice()], row_to_share)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(shares)
        })
        .await
    }

    async fn update_share(&self, id: &ShareId, update: &ShareUpdate) -> Result<()> {
        let id = *id;
        let update = update.clone();

        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE shares SET
                    encrypted_data = ?2, iv = ?3, title = ?4, category = ?5,
                    version = ?6, updated_by = ?7, updated_at = ?8
                 WHERE share_id = ?1",
                params![
                    id.as_bytes().as_slice(),
                    update.sealed.ciphertext.as_slice(),
                    update.sealed.iv.as_slice(),
                    update.title,
                    update.category,
                    update.version as i64,
                    update.updated_by.as_bytes().as_slice(),
                    update.updated_at,
                ],
            )?;

            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
        .await
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
