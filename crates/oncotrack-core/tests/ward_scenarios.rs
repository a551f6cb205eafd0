//! Ward workflows through the exported core API.

use std::sync::Arc;

use oncotrack_core::db::Database;
use oncotrack_core::models::{Patient, PatientStatus, StepStatus};
use oncotrack_core::{
    open_core_in_memory, CoreConfig, FfiAdmissionForm, FfiRadiationDraft, FfiVitalSign,
    MemoryTable, OncoTrackCore, OncoTrackError,
};
use oncotrack_insight::{DisabledProvider, MockProvider, INSIGHT_UNAVAILABLE};

fn jane_form() -> FfiAdmissionForm {
    FfiAdmissionForm {
        name: "Jane Doe".to_string(),
        mrn: "X-1".to_string(),
        age: "54".to_string(),
        gender: "Female".to_string(),
        diagnosis: "Invasive ductal carcinoma".to_string(),
        stage: "IIA".to_string(),
        room_number: "302".to_string(),
        attending_physician: "Dr. Patel".to_string(),
        admission_date: Some("2024-03-01".to_string()),
        status: None,
        allergies: "Penicillin, Latex".to_string(),
        treatment_intent: Some("Adjuvant".to_string()),
        radiation: Some(FfiRadiationDraft {
            target_site: "Left Breast".to_string(),
            technique: None,
            total_dose_gy: "40".to_string(),
            fractions: "20".to_string(),
            start_date: Some("2024-03-04".to_string()),
        }),
    }
}

fn load(core: &OncoTrackCore, id: &str) -> Patient {
    let json = core.get_patient_json(id.to_string()).unwrap().unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_admit_and_fetch() {
    let core = open_core_in_memory().unwrap();

    let outcome = core.admit_patient(jane_form()).unwrap();
    assert!(!outcome.queued);
    assert!(outcome.reason.is_none());

    let fetched = core.fetch_patients().unwrap();
    assert!(!fetched.from_cache);
    assert_eq!(fetched.patients.len(), 1);

    let summary = &fetched.patients[0];
    assert_eq!(summary.id, outcome.patient_id);
    assert_eq!(summary.name, "Jane Doe");
    assert_eq!(summary.gender, "Female");
    assert_eq!(summary.status, "Stable");
    assert_eq!(summary.radiation_progress, Some(0));
    assert!(!summary.local_only);

    let patient = load(&core, &outcome.patient_id);
    assert_eq!(patient.age, 54);
    assert_eq!(patient.allergies, vec!["Penicillin", "Latex"]);
    let plan = patient.radiation_plan.unwrap();
    assert_eq!(plan.technique, "3D-CRT");
    assert_eq!(plan.end_date, "TBD");
    assert_eq!(plan.dose_per_fraction(), Some(2.0));
}

#[test]
fn test_minimal_admission() {
    let core = open_core_in_memory().unwrap();
    let form = FfiAdmissionForm {
        age: String::new(),
        gender: String::new(),
        diagnosis: "Test".to_string(),
        stage: String::new(),
        room_number: String::new(),
        attending_physician: String::new(),
        admission_date: None,
        allergies: String::new(),
        treatment_intent: None,
        radiation: None,
        ..jane_form()
    };
    core.admit_patient(form).unwrap();

    let fetched = core.fetch_patients().unwrap();
    assert_eq!(fetched.patients.len(), 1);
    let patient = load(&core, &fetched.patients[0].id);
    assert_eq!(patient.name, "Jane Doe");
    assert_eq!(patient.mrn, "X-1");
    assert_eq!(patient.age, 0);
    assert!(patient.radiation_plan.is_none());
    assert!(patient.chemo_protocol.is_none());
    assert!(patient.vitals_history.is_empty());
    assert!(patient.allergies.is_empty());
    assert!(patient.image_url.contains("Jane+Doe"));
}

#[test]
fn test_admit_rejects_incomplete_form() {
    let core = open_core_in_memory().unwrap();

    let mut form = jane_form();
    form.name = "  ".to_string();
    assert!(matches!(
        core.admit_patient(form),
        Err(OncoTrackError::InvalidInput(_))
    ));

    let mut form = jane_form();
    if let Some(rt) = form.radiation.as_mut() {
        rt.fractions = String::new();
    }
    assert!(matches!(
        core.admit_patient(form),
        Err(OncoTrackError::InvalidInput(_))
    ));

    let mut form = jane_form();
    form.status = Some("Sleeping".to_string());
    assert!(matches!(
        core.admit_patient(form),
        Err(OncoTrackError::InvalidInput(_))
    ));
}

#[test]
fn test_non_finite_numbers_never_reach_the_cache() {
    let core = open_core_in_memory().unwrap();

    let mut form = jane_form();
    if let Some(rt) = form.radiation.as_mut() {
        rt.total_dose_gy = "NaN".to_string();
    }
    assert!(matches!(
        core.admit_patient(form),
        Err(OncoTrackError::InvalidInput(_))
    ));

    let id = core.admit_patient(jane_form()).unwrap().patient_id;
    let reading = FfiVitalSign {
        date: "2024-03-05".to_string(),
        systolic: 120,
        diastolic: 80,
        heart_rate: 72,
        temp: f64::NAN,
        spo2: 98,
    };
    assert!(matches!(
        core.record_vitals(id.clone(), reading),
        Err(OncoTrackError::InvalidInput(_))
    ));
    assert!(matches!(
        core.record_fraction(id.clone(), None, Some(f64::INFINITY), None),
        Err(OncoTrackError::InvalidInput(_))
    ));

    // Cache still reads back
    assert!(load(&core, &id).vitals_history.is_empty());
    assert_eq!(core.fetch_patients().unwrap().patients.len(), 1);
    assert_eq!(core.dashboard_summary().unwrap().active, 1);
}

#[test]
fn test_half_completed_course_discharge() {
    let core = open_core_in_memory().unwrap();
    let id = core.admit_patient(jane_form()).unwrap().patient_id;
    // Replace the bundled roster with the remote table's contents
    assert_eq!(core.fetch_patients().unwrap().patients.len(), 1);

    for day in 1..=10 {
        let date = format!("2024-03-{:02}", day + 3);
        core.record_fraction(id.clone(), Some(date), None, None).unwrap();
    }
    core.discharge_patient(id.clone()).unwrap();

    let patient = load(&core, &id);
    assert_eq!(patient.status, PatientStatus::Discharged);
    assert!(patient.discharge_date.is_some());
    let plan = patient.radiation_plan.unwrap();
    assert_eq!(plan.fractions_completed, 10);
    assert_eq!(plan.fraction_log.len(), 10);
    assert_eq!(plan.last_fraction_date.as_deref(), Some("2024-03-13"));

    let dashboard = core.dashboard_summary().unwrap();
    assert_eq!(dashboard.discharged, 1);
    assert_eq!(dashboard.active, 0);
    assert!(dashboard.radiation_schedule.is_empty());

    assert!(core.search_directory("jane".to_string()).unwrap().is_empty());
    assert_eq!(core.discharge_log("x-1".to_string()).unwrap().len(), 1);

    core.restore_patient(id.clone()).unwrap();
    let restored = load(&core, &id);
    assert_eq!(restored.status, PatientStatus::Stable);
    assert!(restored.discharge_date.is_none());
    assert!(matches!(
        core.restore_patient(id),
        Err(OncoTrackError::InvalidInput(_))
    ));
}

#[test]
fn test_fraction_past_total_is_refused() {
    let core = open_core_in_memory().unwrap();
    let mut form = jane_form();
    if let Some(rt) = form.radiation.as_mut() {
        rt.total_dose_gy = "8".to_string();
        rt.fractions = "1".to_string();
    }
    let id = core.admit_patient(form).unwrap().patient_id;

    core.record_fraction(id.clone(), None, Some(8.0), None).unwrap();
    let err = core.record_fraction(id.clone(), None, None, None).unwrap_err();
    assert!(matches!(err, OncoTrackError::InvalidInput(_)));
    assert_eq!(load(&core, &id).radiation_plan.unwrap().fractions_completed, 1);
}

#[test]
fn test_note_author_follows_session() {
    let core = open_core_in_memory().unwrap();
    let id = core.admit_patient(jane_form()).unwrap().patient_id;

    core.add_clinical_note(id.clone(), "Seen on rounds".to_string(), "General".to_string())
        .unwrap();

    assert!(matches!(
        core.login("docid".to_string(), "wrong".to_string()),
        Err(OncoTrackError::AuthError(_))
    ));
    core.login("docid".to_string(), "123456".to_string()).unwrap();
    assert!(core.is_authenticated().unwrap());

    core.add_clinical_note(id.clone(), "Biopsy margins clear".to_string(), "pathology".to_string())
        .unwrap();

    let notes = load(&core, &id).clinical_notes;
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].content, "Biopsy margins clear");
    assert_eq!(notes[0].author, "docid");
    assert_eq!(notes[1].author, "Dr. User");

    assert!(core
        .add_clinical_note(id, "   ".to_string(), "General".to_string())
        .is_err());

    core.logout().unwrap();
    assert!(!core.is_authenticated().unwrap());
}

#[test]
fn test_vitals_and_workflow() {
    let core = open_core_in_memory().unwrap();
    let id = core.admit_patient(jane_form()).unwrap().patient_id;

    for date in ["2024-03-05", "2024-03-02"] {
        let reading = FfiVitalSign {
            date: date.to_string(),
            systolic: 120,
            diastolic: 80,
            heart_rate: 72,
            temp: 36.8,
            spo2: 98,
        };
        core.record_vitals(id.clone(), reading).unwrap();
    }
    let vitals = load(&core, &id).vitals_history;
    assert_eq!(vitals[0].date, "2024-03-02");
    assert_eq!(vitals[1].date, "2024-03-05");

    core.advance_workflow_step(
        id.clone(),
        "plan_approval".to_string(),
        "in_progress".to_string(),
        Some("Dr. Chen".to_string()),
    )
    .unwrap();
    let plan = load(&core, &id).radiation_plan.unwrap();
    assert_eq!(plan.workflow.plan_approval.status, StepStatus::InProgress);
    assert_eq!(plan.workflow.plan_approval.staff.as_deref(), Some("Dr. Chen"));

    assert!(matches!(
        core.advance_workflow_step(id, "billing".to_string(), "completed".to_string(), None),
        Err(OncoTrackError::InvalidInput(_))
    ));
}

#[test]
fn test_update_from_json_is_idempotent() {
    let core = open_core_in_memory().unwrap();
    let id = core.admit_patient(jane_form()).unwrap().patient_id;

    let mut patient = load(&core, &id);
    patient.room_number = "401".to_string();
    let json = serde_json::to_string(&patient).unwrap();

    core.update_patient_json(json.clone()).unwrap();
    let first = core.get_patient_json(id.clone()).unwrap();
    core.update_patient_json(json).unwrap();
    assert_eq!(core.get_patient_json(id.clone()).unwrap(), first);
    assert_eq!(load(&core, &id).room_number, "401");
}

#[test]
fn test_insight() {
    let db = Database::open_in_memory().unwrap();
    let core = OncoTrackCore::new(
        db,
        Arc::new(MemoryTable::new()),
        CoreConfig::default(),
        Box::new(MockProvider::answering("Tolerating treatment.")),
    )
    .unwrap();
    let id = core.admit_patient(jane_form()).unwrap().patient_id;

    assert_eq!(core.generate_insight(id).unwrap(), "Tolerating treatment.");
    assert!(matches!(
        core.generate_insight("missing".to_string()),
        Err(OncoTrackError::NotFound(_))
    ));

    let offline = OncoTrackCore::new(
        Database::open_in_memory().unwrap(),
        Arc::new(MemoryTable::new()),
        CoreConfig::default(),
        Box::new(DisabledProvider),
    )
    .unwrap();
    let id = offline.admit_patient(jane_form()).unwrap().patient_id;
    assert_eq!(offline.generate_insight(id).unwrap(), INSIGHT_UNAVAILABLE);
}

#[test]
fn test_settings_and_schema_report() {
    let core = open_core_in_memory().unwrap();

    let mut settings = core.get_settings().unwrap();
    assert_eq!(settings.ward_id, "Wing-3");
    settings.compact_view = true;
    core.save_settings(settings).unwrap();
    assert!(core.get_settings().unwrap().compact_view);

    assert!(core.schema_report().is_none());
    assert_eq!(core.seed_remote().unwrap(), 4);

    let report = core.check_schema().unwrap();
    assert!(report.from_sample);
    assert!(report.compatible);
    assert!(core.schema_report().is_some());

    let dashboard = core.dashboard_summary().unwrap();
    assert_eq!(dashboard.critical, 1);
}
