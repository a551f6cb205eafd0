//! OncoTrack Core Library
//!
//! Offline-tolerant patient management for an oncology ward.
//!
//! # Architecture
//!
//! ```text
//!   Ward views (native shell via UniFFI)
//!                  │
//!          ward workflows ── read current, patch draft
//!                  │
//!     ┌────────────▼────────────┐
//!     │     PatientService      │
//!     │  remote first, filtered │
//!     │  through SchemaProbe    │
//!     └─────┬─────────────┬─────┘
//!           │ ok          │ unreachable / schema mismatch
//!           ▼             ▼
//!     RemoteTable    local snapshot + outbox
//!     (PostgREST)          │
//!           ▲              │ replay on reconnect
//!           └──────────────┘
//! ```
//!
//! # Core Principle
//!
//! **Remote failures never lose a write.** A write the remote refuses is
//! kept locally and queued; the caller learns whether it is pending.
//!
//! # Modules
//!
//! - [`models`]: Patient, treatment plans, vitals, notes
//! - [`db`]: SQLite snapshot cache, outbox and key/value storage
//! - [`remote`]: Remote table trait, PostgREST client, in-memory table
//! - [`schema`]: Column contract and schema probe
//! - [`service`]: Data-access façade and outbox replay
//! - [`ward`]: Admission, discharge, notes, vitals, dashboard queries
//! - [`session`], [`settings`], [`config`], [`logging`]

pub mod config;
pub mod db;
pub mod fixtures;
pub mod logging;
pub mod models;
pub mod remote;
pub mod schema;
pub mod service;
pub mod session;
pub mod settings;
pub mod ward;

// Re-export commonly used types
pub use config::CoreConfig;
pub use db::Database;
pub use models::{Patient, PatientStatus};
pub use remote::{MemoryTable, RemoteTable, RestTable};
pub use schema::SchemaProbe;
pub use service::{DataSource, FetchOutcome, PatientService, WriteOutcome, WriteStatus};
pub use session::Session;
pub use settings::WardSettings;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};
use std::time::Duration;

use oncotrack_insight::gemini::GeminiProvider;
use oncotrack_insight::{DisabledProvider, InsightProvider};

use crate::config::InsightConfig;
use crate::db::OutboxEntry;
use crate::models::{
    Gender, NoteType, StepStatus, TreatmentIntent, VitalSign, WorkflowStepKind,
};
use crate::service::{ConflictKind, ServiceError, SyncReport};
use crate::ward::{AdmissionForm, DashboardSummary, NoteDraft, RadiationDraft};

/// Shared remote handle.
pub type SharedRemote = Arc<dyn RemoteTable + Send + Sync>;

/// Author recorded on notes when no one is logged in.
const FALLBACK_AUTHOR: &str = "Dr. User";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum OncoTrackError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("{0}")]
    AuthError(String),

    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for OncoTrackError {
    fn from(e: db::DbError) -> Self {
        OncoTrackError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for OncoTrackError {
    fn from(e: serde_json::Error) -> Self {
        OncoTrackError::SerializationError(e.to_string())
    }
}

impl From<models::ValidationError> for OncoTrackError {
    fn from(e: models::ValidationError) -> Self {
        OncoTrackError::InvalidInput(e.to_string())
    }
}

impl From<remote::RemoteError> for OncoTrackError {
    fn from(e: remote::RemoteError) -> Self {
        OncoTrackError::RemoteError(e.to_string())
    }
}

impl From<config::ConfigError> for OncoTrackError {
    fn from(e: config::ConfigError) -> Self {
        OncoTrackError::ConfigError(e.to_string())
    }
}

impl From<session::SessionError> for OncoTrackError {
    fn from(e: session::SessionError) -> Self {
        match e {
            session::SessionError::Local(e) => e.into(),
            other => OncoTrackError::AuthError(other.to_string()),
        }
    }
}

impl From<ServiceError> for OncoTrackError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(e) => e.into(),
            ServiceError::Local(e) => e.into(),
            ServiceError::NotFound(id) => OncoTrackError::NotFound(id),
            ServiceError::Remote(e) => e.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for OncoTrackError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        OncoTrackError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install log output. `RUST_LOG` overrides `filter`.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    logging::init_logging(filter.as_deref())
}

/// Open the core from a TOML config file (or defaults), applying
/// environment overrides.
///
/// Without a remote URL the core runs against an in-process table, so only
/// the local cache survives restarts.
#[uniffi::export]
pub fn open_core(config_path: Option<String>) -> Result<Arc<OncoTrackCore>, OncoTrackError> {
    let config = match config_path {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    }
    .with_env_overrides()?;

    let db = Database::open(&config.database_path)?;
    let remote: SharedRemote = if config.remote.is_configured() {
        Arc::new(RestTable::new(&config.remote)?)
    } else {
        tracing::warn!("no remote configured, using in-process patients table");
        Arc::new(MemoryTable::new())
    };
    let insight = insight_provider(&config.insight);

    Ok(Arc::new(OncoTrackCore::new(db, remote, config, insight)?))
}

/// Create a core over an in-memory database and table (for testing).
#[uniffi::export]
pub fn open_core_in_memory() -> Result<Arc<OncoTrackCore>, OncoTrackError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(OncoTrackCore::new(
        db,
        Arc::new(MemoryTable::new()),
        CoreConfig::default(),
        Box::new(DisabledProvider),
    )?))
}

fn insight_provider(config: &InsightConfig) -> Box<dyn InsightProvider + Send + Sync> {
    if !config.is_configured() {
        return Box::new(DisabledProvider);
    }
    match GeminiProvider::new(
        &config.endpoint,
        &config.api_key,
        &config.model,
        Duration::from_secs(config.timeout_secs),
    ) {
        Ok(provider) => Box::new(provider),
        Err(e) => {
            tracing::warn!(error = %e, "insight provider unavailable");
            Box::new(DisabledProvider)
        }
    }
}

fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe core handle for FFI.
#[derive(uniffi::Object)]
pub struct OncoTrackCore {
    db: Arc<Mutex<Database>>,
    remote: SharedRemote,
    probe: SchemaProbe,
    session: Mutex<Session>,
    config: CoreConfig,
    insight: Box<dyn InsightProvider + Send + Sync>,
}

impl OncoTrackCore {
    /// Assemble a core from parts. Resumes any persisted login.
    pub fn new(
        db: Database,
        remote: SharedRemote,
        config: CoreConfig,
        insight: Box<dyn InsightProvider + Send + Sync>,
    ) -> Result<Self, OncoTrackError> {
        let session = Session::restore(&db)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            remote,
            probe: SchemaProbe::new(),
            session: Mutex::new(session),
            config,
            insight,
        })
    }

    /// Run `f` against the façade while holding the database lock.
    fn with_service<T, F>(&self, f: F) -> Result<T, OncoTrackError>
    where
        F: FnOnce(&PatientService<'_, dyn RemoteTable + Send + Sync>) -> service::ServiceResult<T>,
    {
        let db = self.db.lock()?;
        let service = PatientService::new(&db, self.remote.as_ref(), &self.probe);
        Ok(f(&service)?)
    }

    fn author(&self) -> Result<String, OncoTrackError> {
        let session = self.session.lock()?;
        Ok(session.doctor_id().unwrap_or(FALLBACK_AUTHOR).to_string())
    }

    fn patients(&self) -> Result<Vec<Patient>, OncoTrackError> {
        Ok(self.db.lock()?.read_snapshot()?)
    }
}

#[uniffi::export]
impl OncoTrackCore {
    // =========================================================================
    // Session
    // =========================================================================

    pub fn login(&self, doctor_id: String, password: String) -> Result<(), OncoTrackError> {
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        session.login(&db, &self.config.login, &doctor_id, &password)?;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), OncoTrackError> {
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        session.logout(&db, &self.probe)?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> Result<bool, OncoTrackError> {
        Ok(self.session.lock()?.is_authenticated())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Fetch all patients, falling back to the local cache.
    pub fn fetch_patients(&self) -> Result<FfiFetchOutcome, OncoTrackError> {
        let outcome = self.with_service(|s| s.fetch_all())?;
        Ok(outcome.into())
    }

    /// Full patient record as JSON.
    pub fn get_patient_json(&self, id: String) -> Result<Option<String>, OncoTrackError> {
        let db = self.db.lock()?;
        match db.get_cached(&id)? {
            Some(patient) => Ok(Some(serde_json::to_string(&patient)?)),
            None => Ok(None),
        }
    }

    /// Overwrite a patient from an edited JSON record.
    pub fn update_patient_json(&self, json: String) -> Result<FfiWriteOutcome, OncoTrackError> {
        let patient: Patient = serde_json::from_str(&json)?;
        let outcome = self.with_service(|s| s.update(patient))?;
        Ok(outcome.into())
    }

    pub fn admit_patient(&self, form: FfiAdmissionForm) -> Result<FfiWriteOutcome, OncoTrackError> {
        let form = AdmissionForm::try_from(form)?;
        let outcome = self.with_service(|s| s.admit(form))?;
        Ok(outcome.into())
    }

    pub fn delete_patient(&self, id: String) -> Result<FfiWriteOutcome, OncoTrackError> {
        let status = self.with_service(|s| s.delete(&id))?;
        Ok(FfiWriteOutcome::new(id, status))
    }

    /// Discharge as of today.
    pub fn discharge_patient(&self, id: String) -> Result<FfiWriteOutcome, OncoTrackError> {
        let today = today();
        let outcome = self.with_service(|s| s.discharge_patient(&id, &today))?;
        Ok(outcome.into())
    }

    pub fn restore_patient(&self, id: String) -> Result<FfiWriteOutcome, OncoTrackError> {
        let outcome = self.with_service(|s| s.restore_patient(&id))?;
        Ok(outcome.into())
    }

    /// Add a note authored by the logged-in doctor.
    pub fn add_clinical_note(
        &self,
        id: String,
        content: String,
        note_type: String,
    ) -> Result<FfiWriteOutcome, OncoTrackError> {
        let note_type = NoteType::parse(&note_type)
            .ok_or_else(|| OncoTrackError::InvalidInput(format!("note type: {}", note_type)))?;
        let author = self.author()?;
        let note = NoteDraft { content, note_type };
        let outcome = self.with_service(|s| s.add_clinical_note(&id, note, &author))?;
        Ok(outcome.into())
    }

    pub fn record_vitals(
        &self,
        id: String,
        reading: FfiVitalSign,
    ) -> Result<FfiWriteOutcome, OncoTrackError> {
        let outcome = self.with_service(|s| s.record_vitals(&id, reading.into()))?;
        Ok(outcome.into())
    }

    /// Log a delivered fraction. Dose defaults to the planned dose per fraction.
    pub fn record_fraction(
        &self,
        id: String,
        date: Option<String>,
        dose_gy: Option<f64>,
        notes: Option<String>,
    ) -> Result<FfiWriteOutcome, OncoTrackError> {
        let date = date.unwrap_or_else(today);
        let outcome = self.with_service(|s| s.record_fraction(&id, &date, dose_gy, notes))?;
        Ok(outcome.into())
    }

    pub fn advance_workflow_step(
        &self,
        id: String,
        step: String,
        status: String,
        staff: Option<String>,
    ) -> Result<FfiWriteOutcome, OncoTrackError> {
        let kind = WorkflowStepKind::parse(&step)
            .ok_or_else(|| OncoTrackError::InvalidInput(format!("workflow step: {}", step)))?;
        let status = StepStatus::parse(&status)
            .ok_or_else(|| OncoTrackError::InvalidInput(format!("step status: {}", status)))?;
        let date = Some(today());
        let outcome =
            self.with_service(|s| s.advance_workflow_step(&id, kind, status, staff, date))?;
        Ok(outcome.into())
    }

    /// Advisory summary for a patient. Never fails on provider errors.
    pub fn generate_insight(&self, id: String) -> Result<String, OncoTrackError> {
        let patient = self
            .db
            .lock()?
            .get_cached(&id)?
            .ok_or_else(|| OncoTrackError::NotFound(id.clone()))?;
        // Database lock is released before the network call
        Ok(oncotrack_insight::generate_insight(
            self.insight.as_ref(),
            &patient.to_snapshot(),
        ))
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn dashboard_summary(&self) -> Result<FfiDashboardSummary, OncoTrackError> {
        Ok(DashboardSummary::from_patients(&self.patients()?).into())
    }

    pub fn search_directory(&self, query: String) -> Result<Vec<FfiPatientSummary>, OncoTrackError> {
        let patients = self.patients()?;
        Ok(ward::search_directory(&patients, &query)
            .into_iter()
            .map(FfiPatientSummary::from)
            .collect())
    }

    pub fn discharge_log(&self, query: String) -> Result<Vec<FfiPatientSummary>, OncoTrackError> {
        let patients = self.patients()?;
        Ok(ward::discharge_log(&patients, &query)
            .into_iter()
            .map(FfiPatientSummary::from)
            .collect())
    }

    // =========================================================================
    // Sync & Schema
    // =========================================================================

    /// Replay queued writes now.
    pub fn sync_now(&self) -> Result<FfiSyncReport, OncoTrackError> {
        let report = self.with_service(|s| s.replay_outbox())?;
        Ok(report.into())
    }

    pub fn pending_writes(&self) -> Result<u32, OncoTrackError> {
        Ok(self.db.lock()?.pending_count()? as u32)
    }

    /// Writes the remote refused outright, oldest first.
    pub fn rejected_writes(&self) -> Result<Vec<FfiRejectedWrite>, OncoTrackError> {
        let entries = self.db.lock()?.list_rejected()?;
        Ok(entries.into_iter().map(FfiRejectedWrite::from).collect())
    }

    /// Drop a rejected write for good. Returns false if it was already gone.
    pub fn discard_rejected_write(&self, seq: i64) -> Result<bool, OncoTrackError> {
        Ok(self.db.lock()?.discard_rejected(seq)?)
    }

    /// Insert demo patients into an empty remote table.
    pub fn seed_remote(&self) -> Result<u32, OncoTrackError> {
        let count = self.with_service(|s| s.seed_remote())?;
        Ok(count as u32)
    }

    /// Last sampled schema report, if the table has been probed this session.
    pub fn schema_report(&self) -> Option<FfiSchemaReport> {
        self.probe.report().map(Into::into)
    }

    /// Probe the remote schema now.
    pub fn check_schema(&self) -> Result<FfiSchemaReport, OncoTrackError> {
        let report = self.probe.probe(self.remote.as_ref())?;
        Ok(report.into())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn get_settings(&self) -> Result<FfiWardSettings, OncoTrackError> {
        let db = self.db.lock()?;
        Ok(WardSettings::load(&db)?.into())
    }

    pub fn save_settings(&self, settings: FfiWardSettings) -> Result<(), OncoTrackError> {
        let db = self.db.lock()?;
        WardSettings::from(settings).save(&db)?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient list row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSummary {
    pub id: String,
    pub mrn: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub status: String,
    pub diagnosis: String,
    pub stage: String,
    pub room_number: String,
    pub attending_physician: String,
    pub admission_date: String,
    pub discharge_date: Option<String>,
    pub image_url: String,
    pub radiation_progress: Option<u32>,
    pub chemo_progress: Option<u32>,
    /// Not yet stored remotely
    pub local_only: bool,
}

impl From<&Patient> for FfiPatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.clone(),
            mrn: patient.mrn.clone(),
            name: patient.name.clone(),
            age: patient.age,
            gender: patient.gender.as_str().to_string(),
            status: patient.status.as_str().to_string(),
            diagnosis: patient.diagnosis.clone(),
            stage: patient.stage.clone(),
            room_number: patient.room_number.clone(),
            attending_physician: patient.attending_physician.clone(),
            admission_date: patient.admission_date.clone(),
            discharge_date: patient.discharge_date.clone(),
            image_url: patient.image_url.clone(),
            radiation_progress: patient.radiation_plan.as_ref().map(|rt| rt.progress_percent()),
            chemo_progress: patient.chemo_protocol.as_ref().map(|c| c.progress_percent()),
            local_only: patient.is_local_only(),
        }
    }
}

/// FFI-safe fetch result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFetchOutcome {
    pub patients: Vec<FfiPatientSummary>,
    pub from_cache: bool,
    pub reason: Option<String>,
}

impl From<FetchOutcome> for FfiFetchOutcome {
    fn from(outcome: FetchOutcome) -> Self {
        let reason = match outcome.source {
            DataSource::Remote => None,
            DataSource::LocalCache { reason } => Some(reason),
        };
        Self {
            patients: outcome.patients.iter().map(FfiPatientSummary::from).collect(),
            from_cache: reason.is_some(),
            reason,
        }
    }
}

/// FFI-safe write result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWriteOutcome {
    pub patient_id: String,
    /// Stored locally, waiting for the remote
    pub queued: bool,
    pub reason: Option<String>,
}

impl FfiWriteOutcome {
    fn new(patient_id: String, status: WriteStatus) -> Self {
        let reason = match status {
            WriteStatus::Queued { reason } => Some(reason.as_str().to_string()),
            WriteStatus::Remote | WriteStatus::LocalOnly => None,
        };
        Self {
            patient_id,
            queued: status.is_pending(),
            reason,
        }
    }
}

impl From<WriteOutcome> for FfiWriteOutcome {
    fn from(outcome: WriteOutcome) -> Self {
        Self::new(outcome.patient.id, outcome.status)
    }
}

/// FFI-safe radiation section of the admission form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRadiationDraft {
    pub target_site: String,
    pub technique: Option<String>,
    pub total_dose_gy: String,
    pub fractions: String,
    pub start_date: Option<String>,
}

/// FFI-safe admission form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdmissionForm {
    pub name: String,
    pub mrn: String,
    pub age: String,
    pub gender: String,
    pub diagnosis: String,
    pub stage: String,
    pub room_number: String,
    pub attending_physician: String,
    pub admission_date: Option<String>,
    pub status: Option<String>,
    pub allergies: String,
    pub treatment_intent: Option<String>,
    pub radiation: Option<FfiRadiationDraft>,
}

impl TryFrom<FfiAdmissionForm> for AdmissionForm {
    type Error = OncoTrackError;

    fn try_from(form: FfiAdmissionForm) -> Result<Self, Self::Error> {
        let today = today();
        let status = match form.status.as_deref() {
            Some(s) => PatientStatus::parse(s)
                .ok_or_else(|| OncoTrackError::InvalidInput(format!("status: {}", s)))?,
            None => PatientStatus::Stable,
        };
        let treatment_intent = match form.treatment_intent.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(
                TreatmentIntent::parse(s)
                    .ok_or_else(|| OncoTrackError::InvalidInput(format!("treatment intent: {}", s)))?,
            ),
            _ => None,
        };
        let radiation = form.radiation.map(|rt| {
            let defaults = RadiationDraft::new(&today);
            RadiationDraft {
                target_site: rt.target_site,
                technique: rt.technique.unwrap_or(defaults.technique),
                total_dose_gy: rt.total_dose_gy,
                fractions: rt.fractions,
                start_date: rt.start_date.unwrap_or(defaults.start_date),
            }
        });

        Ok(AdmissionForm {
            name: form.name,
            mrn: form.mrn,
            age: form.age,
            gender: Gender::parse(&form.gender),
            diagnosis: form.diagnosis,
            stage: form.stage,
            room_number: form.room_number,
            attending_physician: form.attending_physician,
            admission_date: form.admission_date.unwrap_or(today),
            status,
            allergies: form.allergies,
            treatment_intent,
            radiation,
        })
    }
}

/// FFI-safe vitals reading.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalSign {
    pub date: String,
    pub systolic: u32,
    pub diastolic: u32,
    pub heart_rate: u32,
    pub temp: f64,
    pub spo2: u32,
}

impl From<FfiVitalSign> for VitalSign {
    fn from(v: FfiVitalSign) -> Self {
        VitalSign {
            date: v.date,
            systolic: v.systolic,
            diastolic: v.diastolic,
            heart_rate: v.heart_rate,
            temp: v.temp,
            spo2: v.spo2,
        }
    }
}

/// FFI-safe radiation schedule row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScheduledFraction {
    pub patient_id: String,
    pub patient_name: String,
    pub target_site: String,
    pub fractions_completed: u32,
    pub fractions_total: u32,
    pub started: bool,
}

/// FFI-safe dashboard summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboardSummary {
    pub total: u32,
    pub active: u32,
    pub critical: u32,
    pub stable: u32,
    pub discharge_ready: u32,
    pub discharged: u32,
    pub attention: Vec<String>,
    pub radiation_schedule: Vec<FfiScheduledFraction>,
}

impl From<DashboardSummary> for FfiDashboardSummary {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            total: summary.total as u32,
            active: summary.active as u32,
            critical: summary.critical as u32,
            stable: summary.stable as u32,
            discharge_ready: summary.discharge_ready as u32,
            discharged: summary.discharged as u32,
            attention: summary.attention,
            radiation_schedule: summary
                .radiation_schedule
                .into_iter()
                .map(|s| FfiScheduledFraction {
                    patient_id: s.patient_id,
                    patient_name: s.patient_name,
                    target_site: s.target_site,
                    fractions_completed: s.fractions_completed,
                    fractions_total: s.fractions_total,
                    started: s.started,
                })
                .collect(),
        }
    }
}

/// FFI-safe sync conflict.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncConflict {
    pub patient_id: String,
    /// "remote_newer", "remote_missing" or "refused"
    pub kind: String,
    pub remote_updated_at: Option<String>,
    /// Refusal message from the remote
    pub message: Option<String>,
}

/// FFI-safe replay report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncReport {
    pub replayed: u32,
    pub remaining: u32,
    pub conflicts: Vec<FfiSyncConflict>,
    pub halted: Option<String>,
}

impl From<SyncReport> for FfiSyncReport {
    fn from(report: SyncReport) -> Self {
        Self {
            replayed: report.replayed as u32,
            remaining: report.remaining as u32,
            conflicts: report
                .conflicts
                .into_iter()
                .map(|c| match c.kind {
                    ConflictKind::RemoteNewer { remote_updated_at } => FfiSyncConflict {
                        patient_id: c.patient_id,
                        kind: "remote_newer".into(),
                        remote_updated_at: Some(remote_updated_at),
                        message: None,
                    },
                    ConflictKind::RemoteMissing => FfiSyncConflict {
                        patient_id: c.patient_id,
                        kind: "remote_missing".into(),
                        remote_updated_at: None,
                        message: None,
                    },
                    ConflictKind::Refused { message } => FfiSyncConflict {
                        patient_id: c.patient_id,
                        kind: "refused".into(),
                        remote_updated_at: None,
                        message: Some(message),
                    },
                })
                .collect(),
            halted: report.halted,
        }
    }
}

/// FFI-safe rejected write.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRejectedWrite {
    pub seq: i64,
    /// "create", "update" or "delete"
    pub op: String,
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub queued_at: String,
    pub error: Option<String>,
}

impl From<OutboxEntry> for FfiRejectedWrite {
    fn from(entry: OutboxEntry) -> Self {
        Self {
            seq: entry.seq,
            op: entry.op.as_str().to_string(),
            patient_id: entry.patient_id,
            patient_name: entry.payload.map(|p| p.name),
            queued_at: entry.queued_at,
            error: entry.last_error,
        }
    }
}

/// FFI-safe schema probe report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSchemaReport {
    pub contract_version: u32,
    pub from_sample: bool,
    pub compatible: bool,
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
}

impl From<schema::ProbeReport> for FfiSchemaReport {
    fn from(report: schema::ProbeReport) -> Self {
        Self {
            contract_version: report.contract_version,
            from_sample: report.from_sample,
            compatible: report.ensure_compatible().is_ok(),
            missing_required: report.missing_required,
            missing_optional: report.missing_optional,
        }
    }
}

/// FFI-safe ward settings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWardSettings {
    pub hospital_name: String,
    pub ward_id: String,
    pub notifications: bool,
    pub email_alerts: bool,
    pub dark_mode: bool,
    pub compact_view: bool,
}

impl From<WardSettings> for FfiWardSettings {
    fn from(s: WardSettings) -> Self {
        Self {
            hospital_name: s.hospital_name,
            ward_id: s.ward_id,
            notifications: s.notifications,
            email_alerts: s.email_alerts,
            dark_mode: s.dark_mode,
            compact_view: s.compact_view,
        }
    }
}

impl From<FfiWardSettings> for WardSettings {
    fn from(s: FfiWardSettings) -> Self {
        WardSettings {
            hospital_name: s.hospital_name,
            ward_id: s.ward_id,
            notifications: s.notifications,
            email_alerts: s.email_alerts,
            dark_mode: s.dark_mode,
            compact_view: s.compact_view,
        }
    }
}
