//! Local database layer: snapshot cache, outbox and settings storage.

mod outbox;
mod schema;
mod snapshot;
mod storage;

pub use outbox::*;
pub use schema::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No such record: {0}")]
    NotFound(String),

    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Ward-local SQLite store. Callers serialize access.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        tracing::debug!(path = %path.display(), "opened local store");
        Self::with_connection(conn)
    }

    /// Store that lives only as long as the handle.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Raw connection for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
