//! Versioned column contract for the remote `patients` table.

use std::collections::BTreeSet;

/// Bumped whenever the client starts writing a new column.
pub const CONTRACT_VERSION: u32 = 2;

/// Columns the client cannot work without.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "mrn",
    "name",
    "age",
    "gender",
    "admission_date",
    "diagnosis",
    "stage",
    "room_number",
    "status",
    "attending_physician",
    "radiation_plan",
    "chemo_protocol",
    "vitals_history",
    "allergies",
];

/// Columns added after the first schema. Older tables may lack them.
pub const OPTIONAL_COLUMNS: &[&str] = &[
    "image_url",
    "clinical_notes",
    "treatment_intent",
    "discharge_date",
    "updated_at",
    "created_at",
];

/// Assumed column set when the table is empty and cannot be sampled.
pub const ESSENTIAL_COLUMNS: &[&str] = &[
    "mrn",
    "name",
    "age",
    "gender",
    "admission_date",
    "diagnosis",
    "stage",
    "room_number",
    "status",
    "attending_physician",
    "radiation_plan",
    "chemo_protocol",
    "vitals_history",
    "allergies",
    "image_url",
    "clinical_notes",
];

/// Optional columns a rejected write is retried without.
pub const STRIPPABLE_COLUMNS: &[&str] = &[
    "image_url",
    "clinical_notes",
    "treatment_intent",
    "discharge_date",
    "updated_at",
];

pub type ColumnSet = BTreeSet<String>;

/// The columns a given client version expects.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnContract {
    pub version: u32,
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl Default for ColumnContract {
    fn default() -> Self {
        Self::current()
    }
}

impl ColumnContract {
    /// Contract for this client.
    pub fn current() -> Self {
        Self {
            version: CONTRACT_VERSION,
            required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            optional: OPTIONAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Required columns absent from `columns`.
    pub fn missing_required(&self, columns: &ColumnSet) -> Vec<String> {
        self.required
            .iter()
            .filter(|c| !columns.contains(*c))
            .cloned()
            .collect()
    }

    /// Optional columns absent from `columns`.
    pub fn missing_optional(&self, columns: &ColumnSet) -> Vec<String> {
        self.optional
            .iter()
            .filter(|c| !columns.contains(*c))
            .cloned()
            .collect()
    }
}

pub fn column_set(columns: &[&str]) -> ColumnSet {
    columns.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_table_satisfies_contract() {
        let contract = ColumnContract::current();
        let mut columns = column_set(REQUIRED_COLUMNS);
        columns.extend(column_set(OPTIONAL_COLUMNS));
        assert!(contract.missing_required(&columns).is_empty());
        assert!(contract.missing_optional(&columns).is_empty());
    }

    #[test]
    fn test_missing_columns_reported() {
        let contract = ColumnContract::current();
        let mut columns = column_set(REQUIRED_COLUMNS);
        columns.remove("allergies");
        assert_eq!(contract.missing_required(&columns), vec!["allergies".to_string()]);
        assert_eq!(contract.missing_optional(&columns).len(), OPTIONAL_COLUMNS.len());
    }

    #[test]
    fn test_strippable_are_optional() {
        for column in STRIPPABLE_COLUMNS {
            assert!(OPTIONAL_COLUMNS.contains(column));
        }
    }
}
