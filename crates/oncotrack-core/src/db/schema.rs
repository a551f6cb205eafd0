//! SQLite schema definition.

/// Keys in `local_storage`.
pub const PATIENTS_KEY: &str = "oncotrack-patients";
pub const AUTH_KEY: &str = "oncotrack-auth";
pub const SETTINGS_KEY: &str = "oncotrack-settings";

/// Complete local database schema.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Local Storage (key -> JSON blob)
-- ============================================================================

CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Outbox (writes made while the remote was unavailable, replayed in order)
-- ============================================================================

CREATE TABLE IF NOT EXISTS outbox (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    op TEXT NOT NULL CHECK (op IN ('create', 'update', 'delete')),
    patient_id TEXT NOT NULL,
    payload TEXT,                                -- Patient JSON (create/update only)
    reason TEXT NOT NULL,
    queued_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_outbox_patient ON outbox(patient_id);

-- Deletes never carry a payload, writes always do
CREATE TRIGGER IF NOT EXISTS outbox_check_payload BEFORE INSERT ON outbox
BEGIN
    SELECT CASE
        WHEN new.op = 'delete' AND new.payload IS NOT NULL THEN
            RAISE(ABORT, 'Delete entries cannot have payload')
        WHEN new.op != 'delete' AND new.payload IS NULL THEN
            RAISE(ABORT, 'Write entries must have payload')
    END;
END;

-- ============================================================================
-- Rejected Writes (refused outright by the remote; kept for review, never replayed)
-- ============================================================================

CREATE TABLE IF NOT EXISTS rejected_writes (
    seq INTEGER PRIMARY KEY,                     -- outbox seq it was moved from
    op TEXT NOT NULL,
    patient_id TEXT NOT NULL,
    payload TEXT,
    reason TEXT NOT NULL,
    queued_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    rejected_at TEXT NOT NULL
);

-- ============================================================================
-- Sync State
-- ============================================================================

CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO sync_state (key, value) VALUES ('last_remote_fetch', '');
INSERT OR IGNORE INTO sync_state (key, value) VALUES ('last_replay', '');
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_outbox_payload_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Delete with payload should fail
        let result = conn.execute(
            "INSERT INTO outbox (op, patient_id, payload, reason, queued_at) VALUES ('delete', 'p1', '{}', 'offline', 'now')",
            [],
        );
        assert!(result.is_err());

        // Update without payload should fail
        let result = conn.execute(
            "INSERT INTO outbox (op, patient_id, reason, queued_at) VALUES ('update', 'p1', 'offline', 'now')",
            [],
        );
        assert!(result.is_err());

        // Unknown op should fail
        let result = conn.execute(
            "INSERT INTO outbox (op, patient_id, reason, queued_at) VALUES ('merge', 'p1', 'offline', 'now')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO outbox (op, patient_id, reason, queued_at) VALUES ('delete', 'p1', 'offline', 'now')",
            [],
        );
        assert!(result.is_ok());
    }
}
