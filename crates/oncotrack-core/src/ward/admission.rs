//! Admission form.

use serde::{Deserialize, Serialize};

use crate::models::{
    avatar_url, new_local_id, Gender, Patient, PatientStatus, RadiationPlan, TreatmentIntent,
    ValidationError,
};

/// Radiation plan section of the admission form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadiationDraft {
    pub target_site: String,
    pub technique: String,
    /// As typed; parsed on submit
    pub total_dose_gy: String,
    pub fractions: String,
    pub start_date: String,
}

impl RadiationDraft {
    pub fn new(today: &str) -> Self {
        Self {
            target_site: String::new(),
            technique: "3D-CRT".into(),
            total_dose_gy: String::new(),
            fractions: String::new(),
            start_date: today.to_string(),
        }
    }

    fn into_plan(self) -> Result<RadiationPlan, ValidationError> {
        if self.target_site.trim().is_empty()
            || self.total_dose_gy.trim().is_empty()
            || self.fractions.trim().is_empty()
        {
            return Err(ValidationError::IncompleteRadiationPlan);
        }

        let total_dose_gy = parse_dose("total_dose_gy", &self.total_dose_gy)?;
        let fractions_total: u32 = parse_field("fractions", &self.fractions)?;

        Ok(RadiationPlan {
            id: uuid::Uuid::new_v4().to_string(),
            target_site: self.target_site.trim().to_string(),
            technique: self.technique,
            machine: None,
            total_dose_gy,
            fractions_total,
            fractions_completed: 0,
            start_date: self.start_date,
            end_date: "TBD".into(),
            last_fraction_date: None,
            workflow: Default::default(),
            fraction_log: Vec::new(),
        })
    }
}

/// Admit-new-patient form state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdmissionForm {
    pub name: String,
    pub mrn: String,
    /// As typed; blank or non-numeric means 0
    pub age: String,
    pub gender: Gender,
    pub diagnosis: String,
    pub stage: String,
    pub room_number: String,
    pub attending_physician: String,
    pub admission_date: String,
    pub status: PatientStatus,
    /// Comma-separated
    pub allergies: String,
    pub treatment_intent: Option<TreatmentIntent>,
    /// `None` when the radiation section is unchecked
    pub radiation: Option<RadiationDraft>,
}

impl AdmissionForm {
    /// Blank form dated `today` (`YYYY-MM-DD`).
    pub fn new(today: &str) -> Self {
        Self {
            name: String::new(),
            mrn: String::new(),
            age: String::new(),
            gender: Gender::Male,
            diagnosis: String::new(),
            stage: String::new(),
            room_number: String::new(),
            attending_physician: String::new(),
            admission_date: today.to_string(),
            status: PatientStatus::Stable,
            allergies: String::new(),
            treatment_intent: None,
            radiation: None,
        }
    }

    /// Check required fields without building the patient.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.clone().into_patient().map(|_| ())
    }

    /// Build the patient to submit. The id is local until the remote assigns one.
    pub fn into_patient(self) -> Result<Patient, ValidationError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.mrn.trim().is_empty() {
            missing.push("mrn");
        }
        if self.diagnosis.trim().is_empty() {
            missing.push("diagnosis");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing.join(", ")));
        }

        let radiation_plan = self.radiation.map(RadiationDraft::into_plan).transpose()?;
        let name = self.name.trim().to_string();

        Ok(Patient {
            id: new_local_id(),
            mrn: self.mrn.trim().to_string(),
            image_url: avatar_url(&name),
            name,
            age: self.age.trim().parse().unwrap_or(0),
            gender: self.gender,
            admission_date: self.admission_date,
            discharge_date: None,
            stage: self.stage,
            diagnosis: self.diagnosis.trim().to_string(),
            room_number: self.room_number,
            attending_physician: self.attending_physician,
            status: self.status,
            allergies: parse_allergies(&self.allergies),
            treatment_intent: self.treatment_intent,
            radiation_plan,
            chemo_protocol: None,
            vitals_history: Vec::new(),
            clinical_notes: Vec::new(),
            updated_at: None,
        })
    }
}

/// Split a comma-separated allergy list, dropping blanks.
pub fn parse_allergies(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// A dose in Gy: finite and not negative. `f64::from_str` accepts "NaN" and "inf".
fn parse_dose(field: &str, value: &str) -> Result<f64, ValidationError> {
    let dose: f64 = parse_field(field, value)?;
    if !dose.is_finite() || dose < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(dose)
}
