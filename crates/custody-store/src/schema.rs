//! Database schema for SQLite.
//!
//! There is no migration mechanism. Every statement is `IF NOT EXISTS`, so
//! initialization can run on every open. Changing a table means dropping it
//! by hand and letting [`init`] recreate it.

use rusqlite::Connection;

use crate::error::Result;

/// Create the `identities` and `ledger` tables if they are missing.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Enrolled identities. Names repeat; the highest id wins lookups.
        CREATE TABLE IF NOT EXISTS identities (
            id INTEGER NOT NULL PRIMARY KEY,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL,     -- Unix ms
            public_key BLOB NOT NULL         -- PKIX DER, stored unparsed
        );

        -- Verified signed messages. Append-only.
        CREATE TABLE IF NOT EXISTS ledger (
            id INTEGER NOT NULL PRIMARY KEY,
            created_at INTEGER NOT NULL,     -- Unix ms
            identity INTEGER NOT NULL,
            message BLOB NOT NULL,           -- signed bytes, not necessarily text
            hash BLOB NOT NULL,              -- signature over message

            FOREIGN KEY (identity) REFERENCES identities(id)
        );

        CREATE INDEX IF NOT EXISTS idx_identities_name ON identities(name);
        CREATE INDEX IF NOT EXISTS idx_ledger_identity ON ledger(identity);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_init_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"identities".to_string()));
        assert!(tables.contains(&"ledger".to_string()));
    }

    #[test]
    fn test_init_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap(); // Should not error
        init(&conn).unwrap(); // Still should not error

        assert_eq!(table_names(&conn), vec!["identities", "ledger"]);
    }

    #[test]
    fn test_init_keeps_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        conn.execute(
            "INSERT INTO identities (name, created_at, public_key) VALUES ('evan', 1, x'00')",
            [],
        )
        .unwrap();

        init(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
