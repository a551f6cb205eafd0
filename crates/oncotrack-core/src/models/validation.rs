//! Validation errors surfaced to forms.

use thiserror::Error;

/// A form or record failed validation. Blocks submission.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please fill in all required fields: {0}")]
    MissingFields(String),

    #[error("Please fill in all Radiation Plan details (Target, Dose, Fractions) or uncheck the option.")]
    IncompleteRadiationPlan,

    #[error("Fractions completed ({completed}) cannot exceed fractions total ({total})")]
    FractionsExceeded { completed: u32, total: u32 },

    #[error("Current cycle ({current}) cannot exceed total cycles ({total})")]
    CyclesExceeded { current: u32, total: u32 },

    #[error("Discharged patients must have a discharge date")]
    MissingDischargeDate,

    #[error("Note content cannot be empty")]
    EmptyNote,

    #[error("Patient has no radiation plan")]
    NoRadiationPlan,

    #[error("Only discharged patients can be restored")]
    NotDischarged,

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}
