//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for the custody ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use custody_core::{now_millis, EntryId, Identity, IdentityId, LedgerEntry};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::traits::{IdentityStore, LedgerStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. Each operation is a single statement run
/// under the lock, so every write is atomic on its own.
#[derive(Clone)]
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and the tables if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sqlite store");
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

// Helper to convert a row to Identity
fn row_to_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: IdentityId(row.get("id")?),
        name: row.get("name")?,
        public_key: row.get("public_key")?,
        created_at: row.get("created_at")?,
    })
}

// Helper to convert a row to LedgerEntry
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: EntryId(row.get("id")?),
        identity: IdentityId(row.get("identity")?),
        created_at: row.get("created_at")?,
        message: message_bytes(row)?,
        hash: row.get("hash")?,
    })
}

// Older databases may hold messages as TEXT; both read back as raw bytes.
fn message_bytes(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vec<u8>> {
    match row.get_ref("message")? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Ok(bytes.to_vec()),
        other => Err(rusqlite::Error::InvalidColumnType(
            row.as_ref().column_index("message")?,
            "message".to_string(),
            other.data_type(),
        )),
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn create_identity(&self, name: &str, public_key: &[u8]) -> Result<Identity> {
        let name = name.to_string();
        let public_key = public_key.to_vec();

        self.blocking(move |conn| {
            let created_at = now_millis();
            conn.execute(
                "INSERT INTO identities (name, created_at, public_key) VALUES (?1, ?2, ?3)",
                params![name, created_at, public_key],
            )?;

            Ok(Identity {
                id: IdentityId(conn.last_insert_rowid()),
                name,
                public_key,
                created_at,
            })
        })
        .await
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Identity> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, name, created_at, public_key FROM identities WHERE id = ?1",
                params![id.0],
                row_to_identity,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("no identity with id {id}")))
        })
        .await
    }

    async fn find_all_by_name(&self, name: &str) -> Result<Vec<Identity>> {
        let name = name.to_string();

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at, public_key FROM identities
                 WHERE name = ?1
                 ORDER BY id",
            )?;

            let identities = stmt
                .query_map(params![name], row_to_identity)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(identities)
        })
        .await
    }

    async fn most_recent_by_name(&self, name: &str) -> Result<Identity> {
        let name = name.to_string();

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, name, created_at, public_key FROM identities
                 WHERE name = ?1
                 ORDER BY id DESC
                 LIMIT 1",
                params![name],
                row_to_identity,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("no identity with name {name}")))
        })
        .await
    }

    async fn update_key(&self, id: IdentityId, public_key: &[u8]) -> Result<()> {
        let public_key = public_key.to_vec();

        self.blocking(move |conn| {
            let updated = conn.execute(
                "UPDATE identities SET public_key = ?1 WHERE id = ?2",
                params![public_key, id.0],
            )?;

            if updated == 0 {
                return Err(StoreError::NotFound(format!("no identity with id {id}")));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn append(
        &self,
        identity: IdentityId,
        message: &[u8],
        signature: &[u8],
    ) -> Result<LedgerEntry> {
        let message = message.to_vec();
        let hash = signature.to_vec();

        self.blocking(move |conn| {
            let created_at = now_millis();
            conn.execute(
                "INSERT INTO ledger (created_at, identity, message, hash) VALUES (?1, ?2, ?3, ?4)",
                params![created_at, identity.0, message, hash],
            )?;

            Ok(LedgerEntry {
                id: EntryId(conn.last_insert_rowid()),
                identity,
                created_at,
                message,
                hash,
            })
        })
        .await
    }

    async fn find_by_identity(&self, identity: IdentityId) -> Result<Vec<LedgerEntry>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, identity, message, hash FROM ledger
                 WHERE identity = ?1
                 ORDER BY id",
            )?;

            let entries = stmt
                .query_map(params![identity.0], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(entries)
        })
        .await
    }

    async fn count_by_identity(&self, identity: IdentityId) -> Result<u64> {
        self.blocking(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ledger WHERE identity = ?1",
                params![identity.0],
                |row| row.get(0),
            )?;

            u64::try_from(count).map_err(|_| StoreError::InvalidData(format!("negative count {count}")))
        })
        .await
    }
}
