//! Outbox of writes awaiting replay against the remote table.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::Patient;

/// Kind of queued write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxOp {
    Create,
    Update,
    Delete,
}

impl OutboxOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxOp::Create => "create",
            OutboxOp::Update => "update",
            OutboxOp::Delete => "delete",
        }
    }

    fn parse(s: &str) -> DbResult<Self> {
        match s {
            "create" => Ok(OutboxOp::Create),
            "update" => Ok(OutboxOp::Update),
            "delete" => Ok(OutboxOp::Delete),
            other => Err(DbError::Corrupt(format!("unknown outbox op: {}", other))),
        }
    }
}

/// Why a write went to the outbox instead of the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueReason {
    /// Network failure or backend down
    Unreachable,
    /// Remote table lacks columns the contract requires
    SchemaMismatch,
    /// Remote refused the write for another reason
    Rejected,
}

impl QueueReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueReason::Unreachable => "unreachable",
            QueueReason::SchemaMismatch => "schema_mismatch",
            QueueReason::Rejected => "rejected",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "schema_mismatch" => QueueReason::SchemaMismatch,
            "rejected" => QueueReason::Rejected,
            _ => QueueReason::Unreachable,
        }
    }
}

/// A queued write.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub seq: i64,
    pub op: OutboxOp,
    pub patient_id: String,
    /// Full patient for create/update
    pub payload: Option<Patient>,
    pub reason: QueueReason,
    /// RFC 3339
    pub queued_at: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

struct OutboxRow {
    seq: i64,
    op: String,
    patient_id: String,
    payload: Option<String>,
    reason: String,
    queued_at: String,
    attempts: u32,
    last_error: Option<String>,
}

const ENTRY_COLUMNS: &str = "seq, op, patient_id, payload, reason, queued_at, attempts, last_error";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxRow> {
    Ok(OutboxRow {
        seq: row.get(0)?,
        op: row.get(1)?,
        patient_id: row.get(2)?,
        payload: row.get(3)?,
        reason: row.get(4)?,
        queued_at: row.get(5)?,
        attempts: row.get(6)?,
        last_error: row.get(7)?,
    })
}

impl TryFrom<OutboxRow> for OutboxEntry {
    type Error = DbError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        let payload = row
            .payload
            .map(|json| serde_json::from_str::<Patient>(&json))
            .transpose()?;
        Ok(OutboxEntry {
            seq: row.seq,
            op: OutboxOp::parse(&row.op)?,
            patient_id: row.patient_id,
            payload,
            reason: QueueReason::parse(&row.reason),
            queued_at: row.queued_at,
            attempts: row.attempts,
            last_error: row.last_error,
        })
    }
}

impl Database {
    /// Queue a write. `payload` must be set for create/update.
    pub fn enqueue(
        &self,
        op: OutboxOp,
        patient_id: &str,
        payload: Option<&Patient>,
        reason: QueueReason,
    ) -> DbResult<i64> {
        let payload_json = payload.map(serde_json::to_string).transpose()?;
        self.conn.execute(
            r#"
            INSERT INTO outbox (op, patient_id, payload, reason, queued_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                op.as_str(),
                patient_id,
                payload_json,
                reason.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All queued writes in the order they were made.
    pub fn list_outbox(&self) -> DbResult<Vec<OutboxEntry>> {
        self.list_entries("outbox")
    }

    /// Get a queued write by sequence number.
    pub fn get_outbox_entry(&self, seq: i64) -> DbResult<Option<OutboxEntry>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM outbox WHERE seq = ?", ENTRY_COLUMNS),
                [seq],
                read_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    fn list_entries(&self, table: &str) -> DbResult<Vec<OutboxEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM {} ORDER BY seq", ENTRY_COLUMNS, table))?;
        let rows = stmt.query_map([], read_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    /// Number of writes awaiting replay.
    pub fn pending_count(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Remove a replayed (or abandoned) entry.
    pub fn remove_outbox_entry(&self, seq: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM outbox WHERE seq = ?", [seq])?;
        Ok(rows_affected > 0)
    }

    /// Record a failed replay attempt.
    pub fn record_outbox_attempt(&self, seq: i64, error: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE outbox SET attempts = attempts + 1, last_error = ?2 WHERE seq = ?1",
            params![seq, error],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("outbox entry {}", seq)));
        }
        Ok(())
    }

    /// Check for a queued create of `patient_id`.
    pub fn has_pending_create(&self, patient_id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM outbox WHERE patient_id = ? AND op = 'create'",
            [patient_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Drop every queued write for a patient. Returns the number dropped.
    pub fn drop_pending_for(&self, patient_id: &str) -> DbResult<usize> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM outbox WHERE patient_id = ?", [patient_id])?;
        Ok(rows_affected)
    }

    /// Move one queued write to `rejected_writes`. Returns whether it was queued.
    pub fn reject_outbox_entry(&self, seq: i64, error: &str) -> DbResult<bool> {
        Ok(self.move_to_rejected("seq = ?1", &seq, error)? > 0)
    }

    /// Move every queued write for a patient to `rejected_writes`.
    pub fn reject_pending_for(&self, patient_id: &str, error: &str) -> DbResult<usize> {
        self.move_to_rejected("patient_id = ?1", &patient_id, error)
    }

    fn move_to_rejected(
        &self,
        filter: &str,
        key: &dyn rusqlite::ToSql,
        error: &str,
    ) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                r#"
                INSERT INTO rejected_writes ({cols}, rejected_at)
                SELECT seq, op, patient_id, payload, reason, queued_at, attempts + 1, ?2, ?3
                FROM outbox
                WHERE {filter}
                "#,
                cols = ENTRY_COLUMNS,
                filter = filter,
            ),
            params![key, error, chrono::Utc::now().to_rfc3339()],
        )?;
        let moved = tx.execute(&format!("DELETE FROM outbox WHERE {}", filter), params![key])?;
        tx.commit()?;
        Ok(moved)
    }

    /// Writes the remote refused, oldest first. `last_error` holds the refusal.
    pub fn list_rejected(&self) -> DbResult<Vec<OutboxEntry>> {
        self.list_entries("rejected_writes")
    }

    pub fn rejected_count(&self) -> DbResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM rejected_writes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Forget a rejected write.
    pub fn discard_rejected(&self, seq: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM rejected_writes WHERE seq = ?", [seq])?;
        Ok(rows_affected > 0)
    }

    /// Point later queued writes at the id the remote assigned on create.
    pub fn remap_outbox_patient(&self, old_id: &str, new_id: &str) -> DbResult<usize> {
        let entries: Vec<OutboxEntry> = self
            .list_outbox()?
            .into_iter()
            .filter(|e| e.patient_id == old_id)
            .collect();

        for entry in &entries {
            let payload_json = entry
                .payload
                .as_ref()
                .map(|p| {
                    let mut p = p.clone();
                    p.id = new_id.to_string();
                    serde_json::to_string(&p)
                })
                .transpose()?;
            self.conn.execute(
                "UPDATE outbox SET patient_id = ?2, payload = ?3 WHERE seq = ?1",
                params![entry.seq, new_id, payload_json],
            )?;
        }
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn patient() -> Patient {
        Patient::new("Ines Moreau".into(), "ONC-17".into(), "Ovarian Carcinoma".into())
    }

    #[test]
    fn test_enqueue_and_list_in_order() {
        let db = setup_db();
        let p = patient();

        let s1 = db
            .enqueue(OutboxOp::Create, &p.id, Some(&p), QueueReason::Unreachable)
            .unwrap();
        let s2 = db
            .enqueue(OutboxOp::Update, &p.id, Some(&p), QueueReason::SchemaMismatch)
            .unwrap();
        assert!(s2 > s1);

        let entries = db.list_outbox().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].op, OutboxOp::Create);
        assert_eq!(entries[1].reason, QueueReason::SchemaMismatch);
        assert_eq!(entries[0].payload.as_ref(), Some(&p));
        assert_eq!(db.pending_count().unwrap(), 2);
    }

    #[test]
    fn test_record_attempt() {
        let db = setup_db();
        let p = patient();
        let seq = db
            .enqueue(OutboxOp::Delete, &p.id, None, QueueReason::Unreachable)
            .unwrap();

        db.record_outbox_attempt(seq, "timeout").unwrap();
        db.record_outbox_attempt(seq, "connection refused").unwrap();

        let entry = db.get_outbox_entry(seq).unwrap().unwrap();
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error.as_deref(), Some("connection refused"));
        assert!(db.record_outbox_attempt(999, "x").is_err());
    }

    #[test]
    fn test_reject_moves_patient_entries_aside() {
        let db = setup_db();
        let p = patient();
        let other = Patient::new("Tomas Varga".into(), "ONC-18".into(), "Melanoma".into());
        db.enqueue(OutboxOp::Create, &p.id, Some(&p), QueueReason::Rejected)
            .unwrap();
        let kept = db
            .enqueue(OutboxOp::Create, &other.id, Some(&other), QueueReason::Unreachable)
            .unwrap();
        db.enqueue(OutboxOp::Update, &p.id, Some(&p), QueueReason::Unreachable)
            .unwrap();

        let moved = db.reject_pending_for(&p.id, "duplicate key").unwrap();
        assert_eq!(moved, 2);
        assert_eq!(db.pending_count().unwrap(), 1);
        assert_eq!(db.list_outbox().unwrap()[0].seq, kept);

        let rejected = db.list_rejected().unwrap();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].op, OutboxOp::Create);
        assert_eq!(rejected[0].payload.as_ref(), Some(&p));
        assert_eq!(rejected[0].attempts, 1);
        assert_eq!(rejected[0].last_error.as_deref(), Some("duplicate key"));

        assert!(db.discard_rejected(rejected[0].seq).unwrap());
        assert!(!db.discard_rejected(rejected[0].seq).unwrap());
        assert_eq!(db.rejected_count().unwrap(), 1);

        assert!(db.reject_outbox_entry(kept, "forbidden").unwrap());
        assert!(!db.reject_outbox_entry(kept, "forbidden").unwrap());
        assert_eq!(db.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_remap_and_drop() {
        let db = setup_db();
        let p = patient();
        db.enqueue(OutboxOp::Create, &p.id, Some(&p), QueueReason::Unreachable)
            .unwrap();
        db.enqueue(OutboxOp::Update, &p.id, Some(&p), QueueReason::Unreachable)
            .unwrap();
        assert!(db.has_pending_create(&p.id).unwrap());

        assert_eq!(db.remap_outbox_patient(&p.id, "41").unwrap(), 2);
        let entries = db.list_outbox().unwrap();
        assert!(entries.iter().all(|e| e.patient_id == "41"));
        assert!(entries.iter().all(|e| e.payload.as_ref().unwrap().id == "41"));

        assert_eq!(db.drop_pending_for("41").unwrap(), 2);
        assert_eq!(db.pending_count().unwrap(), 0);
    }
}
