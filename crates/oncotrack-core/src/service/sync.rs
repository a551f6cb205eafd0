//! Outbox replay.
//!
//! Queued writes are replayed oldest first. Replay stops at the first entry
//! the remote cannot take yet (offline, schema behind) so later writes never
//! overtake earlier ones. An entry the remote refuses outright is moved to
//! `rejected_writes` instead, along with any later writes for a patient whose
//! create was refused. Conflicts resolve last-write-wins in favour of the
//! queued write and are reported, not raised.

use super::{PatientService, ServiceResult, Target};
use crate::db::{OutboxEntry, OutboxOp};
use crate::remote::{row_id, RemoteTable};

/// Why a replayed write may have clobbered or lost data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// The remote row changed after the local edit was made
    RemoteNewer { remote_updated_at: String },
    /// The remote row no longer exists; the queued update was dropped
    RemoteMissing,
    /// The remote refused the write; it was moved to the rejected list
    Refused { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConflict {
    pub patient_id: String,
    pub kind: ConflictKind,
}

/// Result of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub replayed: usize,
    pub conflicts: Vec<SyncConflict>,
    /// Entries still queued after the pass
    pub remaining: usize,
    /// Error that stopped the pass early
    pub halted: Option<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.remaining == 0 && self.conflicts.is_empty()
    }
}

/// What happened to a single entry.
enum Step {
    Done,
    Conflict(SyncConflict, bool),
    Halt(String),
    Reject(String),
}

impl Step {
    fn failed(message: String, permanent: bool) -> Self {
        if permanent {
            Step::Reject(message)
        } else {
            Step::Halt(message)
        }
    }
}

impl<'a, R: RemoteTable + ?Sized> PatientService<'a, R> {
    /// Replay queued writes against the remote.
    pub fn replay_outbox(&self) -> ServiceResult<SyncReport> {
        let mut report = SyncReport::default();

        for entry in self.db.list_outbox()? {
            // Ids may have been remapped by an earlier create in this pass
            let entry = match self.db.get_outbox_entry(entry.seq)? {
                Some(current) => current,
                None => continue,
            };

            match self.replay_entry(&entry)? {
                Step::Done => {
                    self.db.remove_outbox_entry(entry.seq)?;
                    report.replayed += 1;
                }
                Step::Conflict(conflict, applied) => {
                    tracing::warn!(
                        patient_id = %conflict.patient_id,
                        conflict = ?conflict.kind,
                        "sync conflict"
                    );
                    self.db.remove_outbox_entry(entry.seq)?;
                    if applied {
                        report.replayed += 1;
                    }
                    report.conflicts.push(conflict);
                }
                Step::Reject(error) => {
                    let moved = if entry.op == OutboxOp::Create {
                        // Nothing later for this patient can land without it
                        self.db.remove_cached(&entry.patient_id)?;
                        self.db.reject_pending_for(&entry.patient_id, &error)?
                    } else {
                        self.db.reject_outbox_entry(entry.seq, &error)? as usize
                    };
                    tracing::error!(
                        patient_id = %entry.patient_id,
                        op = entry.op.as_str(),
                        moved,
                        error = %error,
                        "remote refused queued write, moved to rejected list"
                    );
                    report.conflicts.push(SyncConflict {
                        patient_id: entry.patient_id.clone(),
                        kind: ConflictKind::Refused { message: error },
                    });
                }
                Step::Halt(error) => {
                    self.db.record_outbox_attempt(entry.seq, &error)?;
                    tracing::debug!(seq = entry.seq, error = %error, "replay halted");
                    report.halted = Some(error);
                    break;
                }
            }
        }

        report.remaining = self.db.pending_count()?;
        self.db
            .set_sync_state("last_replay", &chrono::Utc::now().to_rfc3339())?;

        if report.replayed > 0 || !report.conflicts.is_empty() {
            tracing::info!(
                replayed = report.replayed,
                conflicts = report.conflicts.len(),
                remaining = report.remaining,
                "outbox replayed"
            );
        }
        Ok(report)
    }

    fn replay_entry(&self, entry: &OutboxEntry) -> ServiceResult<Step> {
        match entry.op {
            OutboxOp::Create => {
                let Some(patient) = &entry.payload else {
                    return Ok(Step::Done);
                };
                match self.push(Target::Insert, patient) {
                    Ok(Some(row)) => match row_id(&row) {
                        Some(new_id) => {
                            self.db.remap_cached_id(&entry.patient_id, &new_id)?;
                            self.db.remap_outbox_patient(&entry.patient_id, &new_id)?;
                            tracing::debug!(old_id = %entry.patient_id, new_id = %new_id, "synced queued create");
                            Ok(Step::Done)
                        }
                        None => Ok(Step::Halt("insert returned no id".into())),
                    },
                    Ok(None) => Ok(Step::Halt("insert returned no row".into())),
                    Err(failure) => Ok(Step::failed(failure.message, failure.permanent)),
                }
            }
            OutboxOp::Update => {
                let Some(patient) = &entry.payload else {
                    return Ok(Step::Done);
                };
                let missing = || {
                    Step::Conflict(
                        SyncConflict {
                            patient_id: entry.patient_id.clone(),
                            kind: ConflictKind::RemoteMissing,
                        },
                        false,
                    )
                };
                let current = match self.remote.select_one(&entry.patient_id) {
                    Ok(current) => current,
                    Err(e) => return Ok(Step::failed(e.to_string(), e.is_permanent())),
                };
                let Some(current) = current else {
                    return Ok(missing());
                };

                let remote_updated_at = current
                    .get("updated_at")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                let conflict = match (&remote_updated_at, &patient.updated_at) {
                    (Some(remote), Some(local)) if is_newer(remote, local) => Some(SyncConflict {
                        patient_id: entry.patient_id.clone(),
                        kind: ConflictKind::RemoteNewer {
                            remote_updated_at: remote.clone(),
                        },
                    }),
                    _ => None,
                };

                match self.push(Target::Update(&entry.patient_id), patient) {
                    Ok(Some(_)) => Ok(match conflict {
                        Some(conflict) => Step::Conflict(conflict, true),
                        None => Step::Done,
                    }),
                    // Deleted between the read and the write
                    Ok(None) => Ok(missing()),
                    Err(failure) => Ok(Step::failed(failure.message, failure.permanent)),
                }
            }
            OutboxOp::Delete => match self.remote.delete(&entry.patient_id) {
                Ok(()) => Ok(Step::Done),
                Err(e) => Ok(Step::failed(e.to_string(), e.is_permanent())),
            },
        }
    }
}

/// Compare two RFC 3339 timestamps, falling back to string order.
fn is_newer(a: &str, b: &str) -> bool {
    match (
        chrono::DateTime::parse_from_rfc3339(a),
        chrono::DateTime::parse_from_rfc3339(b),
    ) {
        (Ok(a), Ok(b)) => a > b,
        _ => a > b,
    }
}
