//! Patient record transitions.
//!
//! Each function takes the current record and returns the patched draft to
//! submit as a whole-record update. Nothing here touches storage.

use serde::{Deserialize, Serialize};

use crate::models::{
    ClinicalNote, FractionRecord, NoteType, Patient, PatientStatus, StepStatus, ValidationError,
    VitalSign, WorkflowStepKind,
};

/// Discharge on `today`. Treatment records are left as they are.
pub fn discharge(patient: &Patient, today: &str) -> Patient {
    let mut draft = patient.clone();
    draft.status = PatientStatus::Discharged;
    draft.discharge_date = Some(today.to_string());
    draft
}

/// Re-admit a discharged patient as Stable.
pub fn restore(patient: &Patient) -> Result<Patient, ValidationError> {
    if patient.status != PatientStatus::Discharged {
        return Err(ValidationError::NotDischarged);
    }
    let mut draft = patient.clone();
    draft.status = PatientStatus::Stable;
    draft.discharge_date = None;
    Ok(draft)
}

/// Content of the add-note dialog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteDraft {
    pub content: String,
    pub note_type: NoteType,
}

/// Add a note. Notes are kept newest first.
pub fn add_note(
    patient: &Patient,
    draft: NoteDraft,
    author: &str,
) -> Result<Patient, ValidationError> {
    let content = draft.content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyNote);
    }
    let mut next = patient.clone();
    next.clinical_notes.insert(
        0,
        ClinicalNote::new(content.to_string(), draft.note_type, author.to_string()),
    );
    Ok(next)
}

/// Record a vitals reading, keeping the history in date order.
pub fn record_vitals(patient: &Patient, reading: VitalSign) -> Patient {
    let mut draft = patient.clone();
    // After any readings from the same day
    let at = draft
        .vitals_history
        .partition_point(|v| v.date <= reading.date);
    draft.vitals_history.insert(at, reading);
    draft
}

/// Log one delivered fraction.
pub fn record_fraction(
    patient: &Patient,
    date: &str,
    dose_gy: Option<f64>,
    notes: Option<String>,
) -> Result<Patient, ValidationError> {
    let mut draft = patient.clone();
    let plan = draft
        .radiation_plan
        .as_mut()
        .ok_or(ValidationError::NoRadiationPlan)?;

    if plan.fractions_completed >= plan.fractions_total {
        return Err(ValidationError::FractionsExceeded {
            completed: plan.fractions_completed + 1,
            total: plan.fractions_total,
        });
    }

    plan.fractions_completed += 1;
    let dose_gy = dose_gy
        .or_else(|| plan.dose_per_fraction())
        .unwrap_or(0.0);
    plan.fraction_log.push(FractionRecord {
        fraction_number: plan.fractions_completed,
        date: date.to_string(),
        dose_gy,
        notes: notes.filter(|n| !n.trim().is_empty()),
    });
    plan.last_fraction_date = Some(date.to_string());
    Ok(draft)
}

/// Update one step of the radiation planning workflow.
pub fn advance_workflow_step(
    patient: &Patient,
    kind: WorkflowStepKind,
    status: StepStatus,
    staff: Option<String>,
    date: Option<String>,
    notes: Option<String>,
) -> Result<Patient, ValidationError> {
    let mut draft = patient.clone();
    let plan = draft
        .radiation_plan
        .as_mut()
        .ok_or(ValidationError::NoRadiationPlan)?;

    let step = plan.workflow.step_mut(kind);
    step.status = status;
    if staff.is_some() {
        step.staff = staff;
    }
    if date.is_some() {
        step.date = date;
    }
    if notes.is_some() {
        step.notes = notes;
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ward_fixtures;
    use crate::models::RadiationPlan;

    fn with_fractions(completed: u32, total: u32) -> Patient {
        let mut patient = ward_fixtures().remove(0);
        let plan: &mut RadiationPlan = patient.radiation_plan.as_mut().unwrap();
        plan.fractions_completed = completed;
        plan.fractions_total = total;
        plan.total_dose_gy = 2.0 * total as f64;
        patient
    }

    #[test]
    fn test_discharge_keeps_treatment() {
        let patient = with_fractions(10, 20);
        let discharged = discharge(&patient, "2024-03-20");

        assert_eq!(discharged.status, PatientStatus::Discharged);
        assert_eq!(discharged.discharge_date.as_deref(), Some("2024-03-20"));
        assert_eq!(discharged.radiation_plan, patient.radiation_plan);
        assert_eq!(discharged.chemo_protocol, patient.chemo_protocol);
        assert!(discharged.validate().is_ok());
    }

    #[test]
    fn test_restore() {
        let patient = with_fractions(10, 20);
        assert_eq!(restore(&patient), Err(ValidationError::NotDischarged));

        let restored = restore(&discharge(&patient, "2024-03-20")).unwrap();
        assert_eq!(restored.status, PatientStatus::Stable);
        assert!(restored.discharge_date.is_none());
    }

    #[test]
    fn test_add_note() {
        let patient = with_fractions(0, 20);
        let draft = |content: &str| NoteDraft {
            content: content.into(),
            note_type: NoteType::Pathology,
        };

        assert_eq!(
            add_note(&patient, draft("   "), "Dr. Raman"),
            Err(ValidationError::EmptyNote)
        );

        let first = add_note(&patient, draft(" Margins clear "), "Dr. Raman").unwrap();
        let second = add_note(&first, draft("HER2 negative"), "Dr. Raman").unwrap();
        assert_eq!(second.clinical_notes.len(), 2);
        assert_eq!(second.clinical_notes[0].content, "HER2 negative");
        assert_eq!(second.clinical_notes[1].content, "Margins clear");
    }

    #[test]
    fn test_record_vitals_in_date_order() {
        let patient = with_fractions(0, 20);
        let reading = |date: &str| VitalSign {
            date: date.into(),
            systolic: 120,
            diastolic: 80,
            heart_rate: 70,
            temp: 36.6,
            spo2: 98,
        };

        let updated = record_vitals(&patient, reading("2024-03-15"));
        let dates: Vec<&str> = updated.vitals_history.iter().map(|v| v.date.as_str()).collect();
        assert_eq!(dates, ["2024-03-14", "2024-03-15", "2024-03-15", "2024-03-16"]);

        let updated = record_vitals(&updated, reading("2024-03-30"));
        assert_eq!(updated.latest_vitals().unwrap().date, "2024-03-30");
    }

    #[test]
    fn test_record_fraction() {
        let patient = with_fractions(19, 20);
        let updated = record_fraction(&patient, "2024-03-21", None, None).unwrap();
        let plan = updated.radiation_plan.as_ref().unwrap();
        assert_eq!(plan.fractions_completed, 20);
        assert_eq!(plan.last_fraction_date.as_deref(), Some("2024-03-21"));
        let logged = plan.fraction_log.last().unwrap();
        assert_eq!(logged.fraction_number, 20);
        assert!((logged.dose_gy - 2.0).abs() < f64::EPSILON);

        assert_eq!(
            record_fraction(&updated, "2024-03-22", None, None),
            Err(ValidationError::FractionsExceeded {
                completed: 21,
                total: 20
            })
        );
    }

    #[test]
    fn test_record_fraction_without_plan() {
        let patient = ward_fixtures().remove(3);
        assert_eq!(
            record_fraction(&patient, "2024-03-21", Some(2.0), None),
            Err(ValidationError::NoRadiationPlan)
        );
    }

    #[test]
    fn test_advance_workflow_step() {
        let mut patient = with_fractions(0, 20);
        patient.radiation_plan.as_mut().unwrap().workflow = Default::default();

        let updated = advance_workflow_step(
            &patient,
            WorkflowStepKind::Simulation,
            StepStatus::InProgress,
            Some("J. Okafor".into()),
            None,
            None,
        )
        .unwrap();
        let workflow = &updated.radiation_plan.as_ref().unwrap().workflow;
        assert_eq!(workflow.simulation.status, StepStatus::InProgress);
        assert_eq!(workflow.simulation.staff.as_deref(), Some("J. Okafor"));
        assert_eq!(workflow.consultation.status, StepStatus::Pending);
        assert!(!workflow.is_approved());
    }
}
