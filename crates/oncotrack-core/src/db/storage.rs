//! Key/value storage and sync state.

use rusqlite::OptionalExtension;

use super::{Database, DbResult};

impl Database {
    /// Read a stored value.
    pub fn get_item(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Overwrite a stored value.
    pub fn set_item(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a stored value. Returns whether it existed.
    pub fn remove_item(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Get a sync state value (empty means never set).
    pub fn get_sync_state(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM sync_state WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.filter(|s| !s.is_empty()))
    }

    /// Set a sync state value.
    pub fn set_sync_state(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO sync_state (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            [key, value],
        )?;
        Ok(())
    }
}
