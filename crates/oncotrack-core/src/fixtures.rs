//! Bundled demo roster used to seed an empty local cache or remote table.

use crate::models::{
    ChemoDrug, ChemoProtocol, Gender, Patient, PatientStatus, RadiationPlan, RadiationWorkflow,
    StepStatus, TreatmentIntent, VitalSign, WorkflowStep,
};

/// Ids of the demo roster. The remote assigns its own ids when seeded.
const FIXTURE_ID_PREFIX: &str = "demo-";

pub fn is_fixture_id(id: &str) -> bool {
    id.starts_with(FIXTURE_ID_PREFIX)
}

fn vitals(start_day: u32, readings: &[(u32, u32, u32, f64, u32)]) -> Vec<VitalSign> {
    readings
        .iter()
        .enumerate()
        .map(|(i, &(systolic, diastolic, heart_rate, temp, spo2))| VitalSign {
            date: format!("2024-03-{:02}", start_day + i as u32),
            systolic,
            diastolic,
            heart_rate,
            temp,
            spo2,
        })
        .collect()
}

fn completed(date: &str, staff: &str) -> WorkflowStep {
    WorkflowStep {
        status: StepStatus::Completed,
        date: Some(date.into()),
        staff: Some(staff.into()),
        notes: None,
    }
}

/// The demo roster. Deterministic so a seeded cache compares equal.
pub fn ward_fixtures() -> Vec<Patient> {
    vec![
        Patient {
            id: "demo-1".into(),
            mrn: "ONC-2024-014".into(),
            name: "Beatrice Hallam".into(),
            age: 57,
            gender: Gender::Female,
            admission_date: "2024-02-26".into(),
            discharge_date: None,
            stage: "Stage IIA".into(),
            diagnosis: "Invasive Ductal Carcinoma".into(),
            room_number: "308-A".into(),
            attending_physician: "Dr. Priya Raman".into(),
            status: PatientStatus::Stable,
            allergies: vec!["Penicillin".into()],
            treatment_intent: Some(TreatmentIntent::Adjuvant),
            radiation_plan: Some(RadiationPlan {
                id: "rt-1".into(),
                target_site: "Left Breast".into(),
                technique: "3D-CRT".into(),
                machine: Some("Linac 1".into()),
                total_dose_gy: 50.0,
                fractions_total: 25,
                fractions_completed: 14,
                start_date: "2024-03-01".into(),
                end_date: "2024-04-05".into(),
                last_fraction_date: Some("2024-03-19".into()),
                workflow: RadiationWorkflow {
                    consultation: completed("2024-02-27", "Dr. Priya Raman"),
                    simulation: completed("2024-02-28", "J. Okafor"),
                    contouring: completed("2024-02-29", "Dr. Priya Raman"),
                    plan_approval: completed("2024-03-01", "Dr. Priya Raman"),
                },
                fraction_log: Vec::new(),
            }),
            chemo_protocol: Some(ChemoProtocol {
                id: "ct-1".into(),
                protocol_name: "AC (Doxorubicin + Cyclophosphamide)".into(),
                cycle_current: 2,
                cycle_total: 4,
                cycle_frequency_days: 21,
                next_cycle_date: "2024-03-28".into(),
                drugs: vec![
                    ChemoDrug {
                        name: "Doxorubicin".into(),
                        dosage: "60 mg/m2".into(),
                        route: "IV".into(),
                    },
                    ChemoDrug {
                        name: "Cyclophosphamide".into(),
                        dosage: "600 mg/m2".into(),
                        route: "IV".into(),
                    },
                ],
                last_administered_date: Some("2024-03-07".into()),
                notes: None,
            }),
            vitals_history: vitals(
                14,
                &[
                    (122, 78, 74, 36.7, 98),
                    (118, 76, 71, 36.6, 98),
                    (125, 80, 77, 36.9, 97),
                ],
            ),
            clinical_notes: Vec::new(),
            image_url: "https://ui-avatars.com/api/?name=Beatrice+Hallam&background=random".into(),
            updated_at: None,
        },
        Patient {
            id: "demo-2".into(),
            mrn: "ONC-2024-031".into(),
            name: "Gregor Lindqvist".into(),
            age: 69,
            gender: Gender::Male,
            admission_date: "2024-03-04".into(),
            discharge_date: None,
            stage: "Stage IIIB".into(),
            diagnosis: "Non-Small Cell Lung Cancer".into(),
            room_number: "310-B".into(),
            attending_physician: "Dr. Samuel Achebe".into(),
            status: PatientStatus::Critical,
            allergies: vec!["Latex".into()],
            treatment_intent: Some(TreatmentIntent::Radical),
            radiation_plan: Some(RadiationPlan {
                id: "rt-2".into(),
                target_site: "Right Lung Upper Lobe".into(),
                technique: "IMRT".into(),
                machine: Some("Linac 2".into()),
                total_dose_gy: 60.0,
                fractions_total: 30,
                fractions_completed: 4,
                start_date: "2024-03-11".into(),
                end_date: "2024-04-19".into(),
                last_fraction_date: Some("2024-03-14".into()),
                workflow: RadiationWorkflow {
                    consultation: completed("2024-03-05", "Dr. Samuel Achebe"),
                    simulation: completed("2024-03-06", "J. Okafor"),
                    contouring: completed("2024-03-08", "Dr. Samuel Achebe"),
                    plan_approval: completed("2024-03-10", "Dr. Samuel Achebe"),
                },
                fraction_log: Vec::new(),
            }),
            chemo_protocol: None,
            vitals_history: vitals(
                14,
                &[
                    (138, 88, 102, 37.8, 90),
                    (141, 90, 106, 38.1, 89),
                    (135, 86, 98, 37.6, 91),
                ],
            ),
            clinical_notes: Vec::new(),
            image_url: "https://ui-avatars.com/api/?name=Gregor+Lindqvist&background=random"
                .into(),
            updated_at: None,
        },
        Patient {
            id: "demo-3".into(),
            mrn: "ONC-2024-052".into(),
            name: "Yara Benali".into(),
            age: 44,
            gender: Gender::Female,
            admission_date: "2024-02-12".into(),
            discharge_date: None,
            stage: "Grade IV".into(),
            diagnosis: "Glioblastoma".into(),
            room_number: "ICU-03".into(),
            attending_physician: "Dr. Priya Raman".into(),
            status: PatientStatus::Recovering,
            allergies: Vec::new(),
            treatment_intent: Some(TreatmentIntent::Radical),
            radiation_plan: Some(RadiationPlan {
                id: "rt-3".into(),
                target_site: "Brain".into(),
                technique: "VMAT".into(),
                machine: Some("Linac 1".into()),
                total_dose_gy: 60.0,
                fractions_total: 30,
                fractions_completed: 28,
                start_date: "2024-02-15".into(),
                end_date: "2024-03-27".into(),
                last_fraction_date: Some("2024-03-22".into()),
                workflow: RadiationWorkflow {
                    consultation: completed("2024-02-12", "Dr. Priya Raman"),
                    simulation: completed("2024-02-13", "L. Brandt"),
                    contouring: completed("2024-02-14", "Dr. Priya Raman"),
                    plan_approval: completed("2024-02-15", "Dr. Priya Raman"),
                },
                fraction_log: Vec::new(),
            }),
            chemo_protocol: Some(ChemoProtocol {
                id: "ct-3".into(),
                protocol_name: "Temozolomide".into(),
                cycle_current: 1,
                cycle_total: 6,
                cycle_frequency_days: 28,
                next_cycle_date: "2024-04-12".into(),
                drugs: vec![ChemoDrug {
                    name: "Temozolomide".into(),
                    dosage: "75 mg/m2".into(),
                    route: "Oral".into(),
                }],
                last_administered_date: Some("2024-03-15".into()),
                notes: Some("Concurrent with radiotherapy.".into()),
            }),
            vitals_history: vitals(
                14,
                &[
                    (116, 74, 80, 36.8, 97),
                    (119, 75, 78, 36.7, 98),
                    (117, 73, 76, 36.6, 98),
                ],
            ),
            clinical_notes: Vec::new(),
            image_url: "https://ui-avatars.com/api/?name=Yara+Benali&background=random".into(),
            updated_at: None,
        },
        Patient {
            id: "demo-4".into(),
            mrn: "ONC-2024-077".into(),
            name: "Desmond Achterberg".into(),
            age: 63,
            gender: Gender::Male,
            admission_date: "2024-03-08".into(),
            discharge_date: None,
            stage: "Stage III".into(),
            diagnosis: "Colorectal Adenocarcinoma".into(),
            room_number: "305-A".into(),
            attending_physician: "Dr. Samuel Achebe".into(),
            status: PatientStatus::DischargeReady,
            allergies: vec!["Contrast Dye".into()],
            treatment_intent: Some(TreatmentIntent::Adjuvant),
            radiation_plan: None,
            chemo_protocol: Some(ChemoProtocol {
                id: "ct-4".into(),
                protocol_name: "FOLFOX".into(),
                cycle_current: 6,
                cycle_total: 12,
                cycle_frequency_days: 14,
                next_cycle_date: "2024-03-29".into(),
                drugs: vec![
                    ChemoDrug {
                        name: "Oxaliplatin".into(),
                        dosage: "85 mg/m2".into(),
                        route: "IV".into(),
                    },
                    ChemoDrug {
                        name: "Leucovorin".into(),
                        dosage: "400 mg/m2".into(),
                        route: "IV".into(),
                    },
                    ChemoDrug {
                        name: "Fluorouracil".into(),
                        dosage: "2400 mg/m2".into(),
                        route: "IV infusion".into(),
                    },
                ],
                last_administered_date: Some("2024-03-15".into()),
                notes: None,
            }),
            vitals_history: vitals(
                14,
                &[
                    (124, 79, 72, 36.6, 98),
                    (121, 77, 70, 36.5, 99),
                    (120, 78, 69, 36.6, 99),
                ],
            ),
            clinical_notes: Vec::new(),
            image_url: "https://ui-avatars.com/api/?name=Desmond+Achterberg&background=random"
                .into(),
            updated_at: None,
        },
    ]
}
