//! Dashboard, directory and discharge log queries over a patient list.

use serde::{Deserialize, Serialize};

use crate::models::{Patient, PatientStatus};

/// Patients shown in the dashboard's attention panel.
pub const ATTENTION_LIMIT: usize = 4;

/// Today's radiation list entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledFraction {
    pub patient_id: String,
    pub patient_name: String,
    pub target_site: String,
    pub fractions_completed: u32,
    pub fractions_total: u32,
    /// Whether any fraction has been delivered yet
    pub started: bool,
}

/// Ward summary counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub total: usize,
    pub active: usize,
    pub critical: usize,
    pub stable: usize,
    pub discharge_ready: usize,
    pub discharged: usize,
    /// Ids of patients to review first, critical first
    pub attention: Vec<String>,
    pub radiation_schedule: Vec<ScheduledFraction>,
}

impl DashboardSummary {
    pub fn from_patients(patients: &[Patient]) -> Self {
        let count = |status: PatientStatus| patients.iter().filter(|p| p.status == status).count();

        let mut attention: Vec<&Patient> = patients.iter().filter(|p| p.is_active()).collect();
        // Stable sort keeps list order within each group
        attention.sort_by_key(|p| p.status != PatientStatus::Critical);

        let radiation_schedule = patients
            .iter()
            .filter(|p| p.is_active())
            .filter_map(|p| {
                p.radiation_plan.as_ref().map(|rt| ScheduledFraction {
                    patient_id: p.id.clone(),
                    patient_name: p.name.clone(),
                    target_site: rt.target_site.clone(),
                    fractions_completed: rt.fractions_completed,
                    fractions_total: rt.fractions_total,
                    started: rt.last_fraction_date.is_some(),
                })
            })
            .collect();

        Self {
            total: patients.len(),
            active: patients.iter().filter(|p| p.is_active()).count(),
            critical: count(PatientStatus::Critical),
            stable: count(PatientStatus::Stable),
            discharge_ready: count(PatientStatus::DischargeReady),
            discharged: count(PatientStatus::Discharged),
            attention: attention
                .into_iter()
                .take(ATTENTION_LIMIT)
                .map(|p| p.id.clone())
                .collect(),
            radiation_schedule,
        }
    }
}

fn contains_ci(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle)
}

/// Active patients whose name, MRN or diagnosis contains `query`.
pub fn search_directory<'p>(patients: &'p [Patient], query: &str) -> Vec<&'p Patient> {
    let needle = query.trim().to_lowercase();
    patients
        .iter()
        .filter(|p| p.is_active())
        .filter(|p| {
            contains_ci(&p.name, &needle)
                || contains_ci(&p.mrn, &needle)
                || contains_ci(&p.diagnosis, &needle)
        })
        .collect()
}

/// Discharged patients whose name or MRN contains `query`.
pub fn discharge_log<'p>(patients: &'p [Patient], query: &str) -> Vec<&'p Patient> {
    let needle = query.trim().to_lowercase();
    patients
        .iter()
        .filter(|p| p.status == PatientStatus::Discharged)
        .filter(|p| contains_ci(&p.name, &needle) || contains_ci(&p.mrn, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ward_fixtures;
    use crate::ward::discharge;

    fn roster() -> Vec<Patient> {
        let mut patients = ward_fixtures();
        let discharged = discharge(&patients[0], "2024-03-20");
        patients[0] = discharged;
        patients
    }

    #[test]
    fn test_summary_counts() {
        let summary = DashboardSummary::from_patients(&roster());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.active, 3);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.stable, 0);
        assert_eq!(summary.discharge_ready, 1);
        assert_eq!(summary.discharged, 1);
        assert_eq!(summary.attention, vec!["demo-2", "demo-3", "demo-4"]);
        assert_eq!(summary.radiation_schedule.len(), 2);
    }

    #[test]
    fn test_summary_empty() {
        let summary = DashboardSummary::from_patients(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.attention.is_empty());
    }

    #[test]
    fn test_search_directory() {
        let patients = roster();
        let names = |found: Vec<&Patient>| {
            found.iter().map(|p| p.name.clone()).collect::<Vec<_>>()
        };

        assert_eq!(names(search_directory(&patients, "GLIO")), vec!["Yara Benali"]);
        assert_eq!(names(search_directory(&patients, "onc-2024-031")), vec!["Gregor Lindqvist"]);
        // Discharged patients are not in the directory
        assert!(search_directory(&patients, "Hallam").is_empty());
        assert_eq!(search_directory(&patients, "").len(), 3);
    }

    #[test]
    fn test_discharge_log() {
        let patients = roster();
        assert_eq!(discharge_log(&patients, "").len(), 1);
        assert_eq!(discharge_log(&patients, "hallam")[0].id, "demo-1");
        // Diagnosis is not searched here
        assert!(discharge_log(&patients, "carcinoma").is_empty());
    }
}
