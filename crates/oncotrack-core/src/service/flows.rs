//! Read-patch-update flows used by the ward views.

use super::{PatientService, ServiceError, ServiceResult, WriteOutcome};
use crate::models::{Patient, StepStatus, VitalSign, WorkflowStepKind};
use crate::remote::RemoteTable;
use crate::ward::{self, AdmissionForm, NoteDraft};

impl<'a, R: RemoteTable + ?Sized> PatientService<'a, R> {
    /// The current full record, as last fetched or written.
    pub fn current(&self, id: &str) -> ServiceResult<Patient> {
        self.db
            .get_cached(id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Admit a patient from the admission form.
    pub fn admit(&self, form: AdmissionForm) -> ServiceResult<WriteOutcome> {
        let patient = form.into_patient()?;
        tracing::info!(mrn = %patient.mrn, "admitting patient");
        self.create(patient)
    }

    pub fn discharge_patient(&self, id: &str, today: &str) -> ServiceResult<WriteOutcome> {
        let draft = ward::discharge(&self.current(id)?, today);
        self.update(draft)
    }

    pub fn restore_patient(&self, id: &str) -> ServiceResult<WriteOutcome> {
        let draft = ward::restore(&self.current(id)?)?;
        self.update(draft)
    }

    pub fn add_clinical_note(
        &self,
        id: &str,
        note: NoteDraft,
        author: &str,
    ) -> ServiceResult<WriteOutcome> {
        let draft = ward::add_note(&self.current(id)?, note, author)?;
        self.update(draft)
    }

    pub fn record_vitals(&self, id: &str, reading: VitalSign) -> ServiceResult<WriteOutcome> {
        let draft = ward::record_vitals(&self.current(id)?, reading);
        self.update(draft)
    }

    pub fn record_fraction(
        &self,
        id: &str,
        date: &str,
        dose_gy: Option<f64>,
        notes: Option<String>,
    ) -> ServiceResult<WriteOutcome> {
        let draft = ward::record_fraction(&self.current(id)?, date, dose_gy, notes)?;
        self.update(draft)
    }

    pub fn advance_workflow_step(
        &self,
        id: &str,
        kind: WorkflowStepKind,
        status: StepStatus,
        staff: Option<String>,
        date: Option<String>,
    ) -> ServiceResult<WriteOutcome> {
        let draft =
            ward::advance_workflow_step(&self.current(id)?, kind, status, staff, date, None)?;
        self.update(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{NoteType, PatientStatus, ValidationError};
    use crate::remote::MemoryTable;
    use crate::schema::SchemaProbe;
    use crate::service::WriteStatus;

    fn jane_form() -> AdmissionForm {
        AdmissionForm {
            name: "Jane Doe".into(),
            mrn: "X-1".into(),
            diagnosis: "Test".into(),
            ..AdmissionForm::new("2024-03-20")
        }
    }

    #[test]
    fn test_admit_discharge_restore() {
        let db = Database::open_in_memory().unwrap();
        db.write_snapshot(&[]).unwrap();
        let remote = MemoryTable::new();
        let probe = SchemaProbe::new();
        let service = PatientService::new(&db, &remote, &probe);

        let admitted = service.admit(jane_form()).unwrap();
        assert_eq!(admitted.status, WriteStatus::Remote);
        let id = admitted.patient.id;

        let discharged = service.discharge_patient(&id, "2024-03-25").unwrap().patient;
        assert_eq!(discharged.status, PatientStatus::Discharged);
        let cached = db.get_cached(&id).unwrap().unwrap();
        assert_eq!(cached.discharge_date.as_deref(), Some("2024-03-25"));

        let restored = service.restore_patient(&id).unwrap().patient;
        assert_eq!(restored.status, PatientStatus::Stable);
        assert!(matches!(
            service.restore_patient(&id),
            Err(ServiceError::Validation(ValidationError::NotDischarged))
        ));
    }

    #[test]
    fn test_note_while_offline() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryTable::new();
        remote.set_offline(true);
        let probe = SchemaProbe::new();
        let service = PatientService::new(&db, &remote, &probe);

        // Fixtures are seeded on first read
        let outcome = service
            .add_clinical_note(
                "demo-2",
                NoteDraft {
                    content: "Febrile overnight".into(),
                    note_type: NoteType::General,
                },
                "Dr. Achebe",
            )
            .unwrap();
        // Demo records never reach the remote, so nothing is queued
        assert_eq!(outcome.status, WriteStatus::LocalOnly);
        assert_eq!(db.pending_count().unwrap(), 0);
        assert_eq!(outcome.patient.clinical_notes[0].author, "Dr. Achebe");
        assert_eq!(
            db.get_cached("demo-2").unwrap().unwrap().clinical_notes.len(),
            1
        );
    }

    #[test]
    fn test_unknown_patient() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryTable::new();
        let probe = SchemaProbe::new();
        let service = PatientService::new(&db, &remote, &probe);
        assert!(matches!(
            service.discharge_patient("nope", "2024-03-25"),
            Err(ServiceError::NotFound(_))
        ));
    }
}
