//! Patient models.

use serde::{Deserialize, Serialize};

use super::clinical::{ClinicalNote, VitalSign};
use super::treatment::{ChemoProtocol, RadiationPlan};
use super::validation::ValidationError;

/// Prefix for ids assigned on the client while a patient exists only locally.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Ward status of a patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PatientStatus {
    #[default]
    Stable,
    Critical,
    Recovering,
    #[serde(rename = "Discharge Ready")]
    DischargeReady,
    Discharged,
}

impl PatientStatus {
    /// Wire name as stored remotely.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Stable => "Stable",
            PatientStatus::Critical => "Critical",
            PatientStatus::Recovering => "Recovering",
            PatientStatus::DischargeReady => "Discharge Ready",
            PatientStatus::Discharged => "Discharged",
        }
    }

    /// Parse a wire name; accepts `Discharge_Ready`-style variants.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "stable" => Some(Self::Stable),
            "critical" => Some(Self::Critical),
            "recovering" => Some(Self::Recovering),
            "discharge ready" => Some(Self::DischargeReady),
            "discharged" => Some(Self::Discharged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TreatmentIntent {
    Radical,
    Adjuvant,
    Palliative,
}

impl TreatmentIntent {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "radical" => Some(Self::Radical),
            "adjuvant" => Some(Self::Adjuvant),
            "palliative" => Some(Self::Palliative),
            _ => None,
        }
    }
}

/// An oncology ward patient.
///
/// `vitals_history`, `allergies` and `clinical_notes` are always present:
/// missing values deserialize to empty collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Remote row id, or `local-<uuid>` until first sync
    pub id: String,
    /// Medical record number
    pub mrn: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    pub admission_date: String,
    #[serde(default)]
    pub discharge_date: Option<String>,
    /// e.g. "Stage IIB"
    #[serde(default)]
    pub stage: String,
    pub diagnosis: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub attending_physician: String,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub treatment_intent: Option<TreatmentIntent>,
    #[serde(default)]
    pub radiation_plan: Option<RadiationPlan>,
    #[serde(default)]
    pub chemo_protocol: Option<ChemoProtocol>,
    #[serde(default)]
    pub vitals_history: Vec<VitalSign>,
    #[serde(default)]
    pub clinical_notes: Vec<ClinicalNote>,
    #[serde(default)]
    pub image_url: String,
    /// Last write timestamp (RFC 3339)
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Patient {
    /// Create a new patient with required fields and a local id.
    pub fn new(name: String, mrn: String, diagnosis: String) -> Self {
        let image_url = avatar_url(&name);
        Self {
            id: new_local_id(),
            mrn,
            name,
            age: 0,
            gender: Gender::Other,
            admission_date: chrono::Local::now().date_naive().to_string(),
            discharge_date: None,
            stage: String::new(),
            diagnosis,
            room_number: String::new(),
            attending_physician: String::new(),
            status: PatientStatus::Stable,
            allergies: Vec::new(),
            treatment_intent: None,
            radiation_plan: None,
            chemo_protocol: None,
            vitals_history: Vec::new(),
            clinical_notes: Vec::new(),
            image_url,
            updated_at: None,
        }
    }

    /// Check if this patient has only ever been stored locally.
    pub fn is_local_only(&self) -> bool {
        is_local_id(&self.id)
    }

    /// Anyone not yet discharged.
    pub fn is_active(&self) -> bool {
        self.status != PatientStatus::Discharged
    }

    /// Latest vitals reading by date.
    pub fn latest_vitals(&self) -> Option<&VitalSign> {
        self.vitals_history.iter().max_by(|a, b| a.date.cmp(&b.date))
    }

    /// Fill the avatar if none is stored.
    pub fn ensure_image_url(&mut self) {
        if self.image_url.trim().is_empty() {
            self.image_url = avatar_url(&self.name);
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Check record invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
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

        if let Some(rt) = &self.radiation_plan {
            check_measurement("total_dose_gy", rt.total_dose_gy)?;
            for fraction in &rt.fraction_log {
                check_measurement("dose_gy", fraction.dose_gy)?;
            }
            if rt.fractions_completed > rt.fractions_total {
                return Err(ValidationError::FractionsExceeded {
                    completed: rt.fractions_completed,
                    total: rt.fractions_total,
                });
            }
        }

        if let Some(chemo) = &self.chemo_protocol {
            if chemo.cycle_current > chemo.cycle_total {
                return Err(ValidationError::CyclesExceeded {
                    current: chemo.cycle_current,
                    total: chemo.cycle_total,
                });
            }
        }

        for reading in &self.vitals_history {
            check_measurement("temp", reading.temp)?;
        }

        if self.status == PatientStatus::Discharged && self.discharge_date.is_none() {
            return Err(ValidationError::MissingDischargeDate);
        }

        Ok(())
    }

    /// Summary for the insight prompt.
    pub fn to_snapshot(&self) -> oncotrack_insight::PatientSnapshot {
        use oncotrack_insight::{ChemoSummary, PatientSnapshot, RadiationSummary, VitalsSummary};

        PatientSnapshot {
            name: self.name.clone(),
            age: self.age,
            gender: self.gender.as_str().to_string(),
            diagnosis: self.diagnosis.clone(),
            stage: self.stage.clone(),
            status: self.status.as_str().to_string(),
            radiation: self.radiation_plan.as_ref().map(|rt| RadiationSummary {
                target_site: rt.target_site.clone(),
                technique: rt.technique.clone(),
                fractions_completed: rt.fractions_completed,
                fractions_total: rt.fractions_total,
            }),
            chemo: self.chemo_protocol.as_ref().map(|c| ChemoSummary {
                protocol_name: c.protocol_name.clone(),
                cycle_current: c.cycle_current,
                cycle_total: c.cycle_total,
            }),
            // Last entry as recorded, matching what the vitals chart shows
            latest_vitals: self.vitals_history.last().map(|v| VitalsSummary {
                date: v.date.clone(),
                systolic: v.systolic,
                diastolic: v.diastolic,
                heart_rate: v.heart_rate,
                temp: v.temp,
                spo2: v.spo2,
            }),
        }
    }
}

/// Generate a client-side id for a locally persisted patient.
/// NaN and infinities serialize as JSON `null` and would not read back.
fn check_measurement(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

pub fn new_local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4())
}

/// Synthesize an initials avatar URL from a patient name.
pub fn avatar_url(name: &str) -> String {
    match reqwest::Url::parse_with_params(
        "https://ui-avatars.com/api/",
        &[("name", name), ("background", "random")],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => "https://ui-avatars.com/api/?background=random".to_string(),
    }
}
