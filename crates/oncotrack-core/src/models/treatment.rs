//! Radiation and chemotherapy treatment models.

use serde::{Deserialize, Serialize};

/// Status of a single radiation workflow step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl StepStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-'], " ").as_str() {
            "pending" => Some(Self::Pending),
            "in progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// One approval step in the radiation planning workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WorkflowStep {
    #[serde(default)]
    pub status: StepStatus,
    pub date: Option<String>,
    pub staff: Option<String>,
    pub notes: Option<String>,
}

/// The four named steps a plan passes through before treatment starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStepKind {
    Consultation,
    Simulation,
    Contouring,
    PlanApproval,
}

impl WorkflowStepKind {
    pub const ALL: [WorkflowStepKind; 4] = [
        WorkflowStepKind::Consultation,
        WorkflowStepKind::Simulation,
        WorkflowStepKind::Contouring,
        WorkflowStepKind::PlanApproval,
    ];

    /// Parse a step name as used by shells ("consultation", "plan_approval", ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().replace([' ', '-'], "_").as_str() {
            "consultation" => Some(Self::Consultation),
            "simulation" => Some(Self::Simulation),
            "contouring" => Some(Self::Contouring),
            "plan_approval" | "approval" => Some(Self::PlanApproval),
            _ => None,
        }
    }
}

/// Radiation planning workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RadiationWorkflow {
    #[serde(default)]
    pub consultation: WorkflowStep,
    #[serde(default)]
    pub simulation: WorkflowStep,
    #[serde(default)]
    pub contouring: WorkflowStep,
    #[serde(default)]
    pub plan_approval: WorkflowStep,
}

impl RadiationWorkflow {
    pub fn step(&self, kind: WorkflowStepKind) -> &WorkflowStep {
        match kind {
            WorkflowStepKind::Consultation => &self.consultation,
            WorkflowStepKind::Simulation => &self.simulation,
            WorkflowStepKind::Contouring => &self.contouring,
            WorkflowStepKind::PlanApproval => &self.plan_approval,
        }
    }

    pub fn step_mut(&mut self, kind: WorkflowStepKind) -> &mut WorkflowStep {
        match kind {
            WorkflowStepKind::Consultation => &mut self.consultation,
            WorkflowStepKind::Simulation => &mut self.simulation,
            WorkflowStepKind::Contouring => &mut self.contouring,
            WorkflowStepKind::PlanApproval => &mut self.plan_approval,
        }
    }

    /// True once every step is completed.
    pub fn is_approved(&self) -> bool {
        WorkflowStepKind::ALL
            .iter()
            .all(|k| self.step(*k).status == StepStatus::Completed)
    }
}

/// One delivered fraction in the daily treatment log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FractionRecord {
    pub fraction_number: u32,
    pub date: String,
    pub dose_gy: f64,
    pub notes: Option<String>,
}

/// A course of radiation therapy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadiationPlan {
    pub id: String,
    /// e.g. "Left Breast", "Prostate"
    pub target_site: String,
    /// e.g. "IMRT", "VMAT", "3D-CRT"
    pub technique: String,
    #[serde(default)]
    pub machine: Option<String>,
    pub total_dose_gy: f64,
    pub fractions_total: u32,
    #[serde(default)]
    pub fractions_completed: u32,
    pub start_date: String,
    /// "TBD" until scheduled
    pub end_date: String,
    #[serde(default)]
    pub last_fraction_date: Option<String>,
    #[serde(default)]
    pub workflow: RadiationWorkflow,
    #[serde(default)]
    pub fraction_log: Vec<FractionRecord>,
}

impl RadiationPlan {
    /// Dose per fraction in Gy, if the plan has any fractions.
    pub fn dose_per_fraction(&self) -> Option<f64> {
        (self.fractions_total > 0).then(|| self.total_dose_gy / self.fractions_total as f64)
    }

    /// Percent of fractions delivered, rounded.
    pub fn progress_percent(&self) -> u32 {
        percent(self.fractions_completed, self.fractions_total)
    }
}

/// One drug in a chemotherapy protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemoDrug {
    pub name: String,
    /// e.g. "60 mg/m2"
    pub dosage: String,
    /// e.g. "IV", "Oral"
    pub route: String,
}

/// A chemotherapy protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemoProtocol {
    pub id: String,
    /// e.g. "AC-T", "FOLFOX"
    pub protocol_name: String,
    pub cycle_current: u32,
    pub cycle_total: u32,
    #[serde(default)]
    pub cycle_frequency_days: u32,
    pub next_cycle_date: String,
    #[serde(default)]
    pub drugs: Vec<ChemoDrug>,
    #[serde(default)]
    pub last_administered_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ChemoProtocol {
    /// Percent of cycles reached, rounded.
    pub fn progress_percent(&self) -> u32 {
        percent(self.cycle_current, self.cycle_total)
    }
}

fn percent(done: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u32
}
