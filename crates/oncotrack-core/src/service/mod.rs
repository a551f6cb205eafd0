//! Patient data-access façade.
//!
//! Every operation tries the remote table first. Remote failures (network or
//! schema) never reach the caller: reads fall back to the local snapshot and
//! writes land in the local snapshot plus the outbox, to be replayed once the
//! remote accepts them again. The only errors returned are validation
//! failures and local storage failures.

mod flows;
mod sync;

pub use flows::*;
pub use sync::*;

use thiserror::Error;

use crate::db::{Database, DbError, OutboxOp, QueueReason};
use crate::fixtures::is_fixture_id;
use crate::models::{is_local_id, new_local_id, Patient, ValidationError};
use crate::remote::{patient_to_row, row_id, RemoteError, RemoteTable, Row};
use crate::schema::{SchemaProbe, STRIPPABLE_COLUMNS};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Local storage error: {0}")]
    Local(#[from] DbError),

    #[error("Patient not found: {0}")]
    NotFound(String),

    /// Only returned by explicit remote-only operations such as seeding.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Where a fetched patient list came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Remote,
    /// Degraded mode: the remote could not be read
    LocalCache { reason: String },
}

/// Result of [`PatientService::fetch_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub patients: Vec<Patient>,
    pub source: DataSource,
}

impl FetchOutcome {
    /// True when the list came from the local cache.
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, DataSource::LocalCache { .. })
    }
}

/// How far a write got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Stored remotely (and in the local cache)
    Remote,
    /// Stored locally and queued for replay
    Queued { reason: QueueReason },
    /// The record never reached the remote, so there was nothing to sync
    LocalOnly,
}

impl WriteStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, WriteStatus::Queued { .. })
    }
}

/// Result of a create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// The patient as stored, with its final id
    pub patient: Patient,
    pub status: WriteStatus,
}

/// Remote write target.
#[derive(Debug, Clone, Copy)]
enum Target<'t> {
    Insert,
    Update(&'t str),
}

/// A remote write that could not be completed.
#[derive(Debug, Clone)]
struct PushFailure {
    reason: QueueReason,
    message: String,
    /// Resending will be refused again
    permanent: bool,
}

impl PushFailure {
    fn new(reason: QueueReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            permanent: false,
        }
    }

    fn from_remote(e: &RemoteError) -> Self {
        let reason = if e.is_unreachable() {
            QueueReason::Unreachable
        } else if e.is_schema_mismatch() {
            QueueReason::SchemaMismatch
        } else {
            QueueReason::Rejected
        };
        Self {
            reason,
            message: e.to_string(),
            permanent: e.is_permanent(),
        }
    }
}

/// Patient data access over a remote table and the local cache.
pub struct PatientService<'a, R: RemoteTable + ?Sized> {
    db: &'a Database,
    remote: &'a R,
    probe: &'a SchemaProbe,
}

impl<'a, R: RemoteTable + ?Sized> PatientService<'a, R> {
    pub fn new(db: &'a Database, remote: &'a R, probe: &'a SchemaProbe) -> Self {
        Self { db, remote, probe }
    }

    // =========================================================================
    // Façade Operations
    // =========================================================================

    /// Fetch all patients, newest first.
    pub fn fetch_all(&self) -> ServiceResult<FetchOutcome> {
        if !self.flush_pending()? {
            let pending = self.db.pending_count()?;
            return self.local_outcome(format!("{} writes pending sync", pending));
        }

        match self.remote.select_all() {
            Ok(rows) => {
                let patients: Vec<Patient> = rows.iter().map(crate::remote::row_to_patient).collect();
                self.db.write_snapshot(&patients)?;
                self.db
                    .set_sync_state("last_remote_fetch", &chrono::Utc::now().to_rfc3339())?;
                tracing::debug!(count = patients.len(), "fetched patients from remote");
                Ok(FetchOutcome {
                    patients,
                    source: DataSource::Remote,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote fetch failed, serving local cache");
                self.local_outcome(e.to_string())
            }
        }
    }

    /// Create a patient.
    pub fn create(&self, patient: Patient) -> ServiceResult<WriteOutcome> {
        let mut patient = patient;
        patient.validate()?;
        patient.ensure_image_url();
        patient.touch();

        let failure = if self.flush_pending()? {
            match self.push(Target::Insert, &patient) {
                Ok(Some(row)) => match row_id(&row) {
                    Some(id) => {
                        patient.id = id;
                        self.db.upsert_cached(&patient)?;
                        tracing::info!(patient_id = %patient.id, "created patient remotely");
                        return Ok(WriteOutcome {
                            patient,
                            status: WriteStatus::Remote,
                        });
                    }
                    None => PushFailure::new(QueueReason::Rejected, "insert returned no id"),
                },
                Ok(None) => PushFailure::new(QueueReason::Rejected, "insert returned no row"),
                Err(failure) => failure,
            }
        } else {
            PushFailure::new(QueueReason::Unreachable, "earlier writes still pending")
        };

        if !patient.is_local_only() {
            patient.id = new_local_id();
        }
        self.queue(OutboxOp::Create, &patient, failure)
    }

    /// Overwrite a patient record.
    ///
    /// The id must name a cached patient. A local id is only accepted while
    /// its create is still queued; bundled demo records are never on the
    /// remote and are updated in the cache alone.
    pub fn update(&self, patient: Patient) -> ServiceResult<WriteOutcome> {
        let mut patient = patient;
        patient.validate()?;
        patient.ensure_image_url();

        let cached = self
            .db
            .get_cached(&patient.id)?
            .ok_or_else(|| ServiceError::NotFound(patient.id.clone()))?;
        if patient.is_local_only() && !self.db.has_pending_create(&patient.id)? {
            tracing::warn!(patient_id = %patient.id, "update for a local id that is no longer queued");
            return Err(ServiceError::NotFound(patient.id));
        }
        stamp(&mut patient, &cached);

        if is_fixture_id(&patient.id) {
            self.db.upsert_cached(&patient)?;
            tracing::debug!(patient_id = %patient.id, "updated demo patient locally");
            return Ok(WriteOutcome {
                patient,
                status: WriteStatus::LocalOnly,
            });
        }

        let failure = if patient.is_local_only() {
            // Not on the remote yet; rides behind its queued create
            PushFailure::new(QueueReason::Unreachable, "patient not yet synced")
        } else if self.flush_pending()? {
            match self.push(Target::Update(&patient.id), &patient) {
                Ok(Some(_)) => {
                    self.db.upsert_cached(&patient)?;
                    tracing::debug!(patient_id = %patient.id, "updated patient remotely");
                    return Ok(WriteOutcome {
                        patient,
                        status: WriteStatus::Remote,
                    });
                }
                Ok(None) => PushFailure::new(
                    QueueReason::Rejected,
                    format!("no remote row with id {}", patient.id),
                ),
                Err(failure) => failure,
            }
        } else {
            PushFailure::new(QueueReason::Unreachable, "earlier writes still pending")
        };

        self.queue(OutboxOp::Update, &patient, failure)
    }

    /// Permanently delete a patient.
    pub fn delete(&self, id: &str) -> ServiceResult<WriteStatus> {
        if self.db.has_pending_create(id)? || is_local_id(id) || is_fixture_id(id) {
            let dropped = self.db.drop_pending_for(id)?;
            self.db.remove_cached(id)?;
            tracing::info!(patient_id = id, dropped, "deleted unsynced patient");
            return Ok(WriteStatus::LocalOnly);
        }

        let failure = if self.flush_pending()? {
            match self.remote.delete(id) {
                Ok(()) => {
                    self.db.remove_cached(id)?;
                    tracing::info!(patient_id = id, "deleted patient remotely");
                    return Ok(WriteStatus::Remote);
                }
                Err(e) => PushFailure::from_remote(&e),
            }
        } else {
            PushFailure::new(QueueReason::Unreachable, "earlier writes still pending")
        };

        tracing::warn!(
            patient_id = id,
            reason = failure.reason.as_str(),
            error = %failure.message,
            "remote delete failed, removing locally and queueing"
        );
        self.db.remove_cached(id)?;
        self.db.enqueue(OutboxOp::Delete, id, None, failure.reason)?;
        Ok(WriteStatus::Queued {
            reason: failure.reason,
        })
    }

    /// Insert the bundled fixture roster into an empty remote table.
    /// Returns the number of rows inserted (zero if the table has rows).
    pub fn seed_remote(&self) -> ServiceResult<usize> {
        if self.remote.sample()?.is_some() {
            return Ok(0);
        }

        let report = self.probe.probe(self.remote)?;
        let rows: Vec<Row> = crate::fixtures::ward_fixtures()
            .iter()
            .map(|p| report.filter(&patient_to_row(p)))
            .collect();

        let inserted = match self.remote.insert(&rows) {
            Ok(stored) => stored,
            Err(e) => {
                let stripped = strippable_columns(&e);
                if stripped.is_empty() {
                    return Err(e.into());
                }
                tracing::warn!(columns = ?stripped, "schema mismatch during seed, retrying without columns");
                let rows: Vec<Row> = rows.iter().map(|r| strip(r, &stripped)).collect();
                self.remote.insert(&rows)?
            }
        };

        tracing::info!(count = inserted.len(), "seeded remote patients table");
        Ok(inserted.len())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Read the cached patient list as a degraded outcome.
    fn local_outcome(&self, reason: String) -> ServiceResult<FetchOutcome> {
        Ok(FetchOutcome {
            patients: self.db.read_snapshot()?,
            source: DataSource::LocalCache { reason },
        })
    }

    /// Store locally and queue for replay.
    fn queue(
        &self,
        op: OutboxOp,
        patient: &Patient,
        failure: PushFailure,
    ) -> ServiceResult<WriteOutcome> {
        if failure.reason == QueueReason::SchemaMismatch {
            tracing::error!(
                patient_id = %patient.id,
                error = %failure.message,
                "remote schema incompatible, write kept locally"
            );
        } else {
            tracing::warn!(
                patient_id = %patient.id,
                reason = failure.reason.as_str(),
                error = %failure.message,
                "remote write failed, queued locally"
            );
        }

        self.db.upsert_cached(patient)?;
        self.db
            .enqueue(op, &patient.id, Some(patient), failure.reason)?;
        Ok(WriteOutcome {
            patient: patient.clone(),
            status: WriteStatus::Queued {
                reason: failure.reason,
            },
        })
    }

    /// Replay the outbox if it has entries. Returns true once it is empty.
    fn flush_pending(&self) -> ServiceResult<bool> {
        if self.db.pending_count()? == 0 {
            return Ok(true);
        }
        let report = self.replay_outbox()?;
        Ok(report.remaining == 0)
    }

    /// Write one patient to the remote: probe the schema, filter the row,
    /// and retry once without optional columns the remote rejects.
    fn push(&self, target: Target<'_>, patient: &Patient) -> Result<Option<Row>, PushFailure> {
        let report = self
            .probe
            .probe(self.remote)
            .map_err(|e| PushFailure::from_remote(&e))?;

        if let Err(e) = report.ensure_compatible() {
            return Err(PushFailure::new(QueueReason::SchemaMismatch, e.to_string()));
        }

        let row = report.filter(&patient_to_row(patient));
        match self.send(target, &row) {
            Ok(stored) => Ok(stored),
            Err(e) => {
                let stripped = strippable_columns(&e);
                if stripped.is_empty() {
                    return Err(PushFailure::from_remote(&e));
                }

                tracing::warn!(
                    patient_id = %patient.id,
                    columns = ?stripped,
                    "schema mismatch, retrying write without columns"
                );
                // The cached column set was wrong
                self.probe.reset();
                self.send(target, &strip(&row, &stripped))
                    .map_err(|e| PushFailure::from_remote(&e))
            }
        }
    }

    fn send(&self, target: Target<'_>, row: &Row) -> Result<Option<Row>, RemoteError> {
        match target {
            Target::Insert => Ok(self
                .remote
                .insert(std::slice::from_ref(row))?
                .into_iter()
                .next()),
            Target::Update(id) => self.remote.update(id, row),
        }
    }
}

/// Set `updated_at` unless the record is unchanged from the cached copy,
/// so repeating an update stores the same state.
fn stamp(patient: &mut Patient, cached: &Patient) {
    let mut candidate = patient.clone();
    candidate.updated_at = cached.updated_at.clone();
    if candidate == *cached {
        patient.updated_at = cached.updated_at.clone();
    } else {
        patient.touch();
    }
}

/// Optional columns named in a remote error.
fn strippable_columns(e: &RemoteError) -> Vec<&'static str> {
    e.mentioned_columns(STRIPPABLE_COLUMNS)
}

fn strip(row: &Row, columns: &[&str]) -> Row {
    let mut row = row.clone();
    for column in columns {
        row.remove(*column);
    }
    row
}
