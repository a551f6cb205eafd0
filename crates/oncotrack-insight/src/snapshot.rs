//! Patient snapshot handed to the insight generator.

use serde::{Deserialize, Serialize};

/// The subset of a patient record an insight prompt is built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSnapshot {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub diagnosis: String,
    pub stage: String,
    pub status: String,
    pub radiation: Option<RadiationSummary>,
    pub chemo: Option<ChemoSummary>,
    /// Most recent vitals entry only
    pub latest_vitals: Option<VitalsSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadiationSummary {
    pub target_site: String,
    pub technique: String,
    pub fractions_completed: u32,
    pub fractions_total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemoSummary {
    pub protocol_name: String,
    pub cycle_current: u32,
    pub cycle_total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalsSummary {
    pub date: String,
    pub systolic: u32,
    pub diastolic: u32,
    pub heart_rate: u32,
    pub temp: f64,
    pub spo2: u32,
}
