pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::init(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside a single transaction. Commits when `f` returns `Ok`,
    /// rolls back on `Err` (the transaction is dropped uncommitted).
    pub fn unit_of_work<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Session<'_>) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;

        let out = f(&Session { conn: &tx })?;

        tx.commit().map_err(anyhow::Error::from)?;
        Ok(out)
    }
}

/// Request-scoped view of the store. Every query runs inside the
/// transaction opened by [`Database::unit_of_work`].
pub struct Session<'a> {
    conn: &'a Connection,
}
