//! Lazy discovery of the remote column set.

use std::sync::Mutex;

use thiserror::Error;

use super::contract::{column_set, ColumnContract, ColumnSet, ESSENTIAL_COLUMNS};
use crate::remote::{RemoteResult, RemoteTable, Row};

/// Schema incompatibilities that need an operator, not a retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("remote table needs migration to contract v{version}: missing columns {missing:?}")]
    MigrationRequired { version: u32, missing: Vec<String> },
}

/// Outcome of probing the remote table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub contract_version: u32,
    /// Columns outgoing payloads are restricted to
    pub columns: ColumnSet,
    /// False when the table was empty and [`ESSENTIAL_COLUMNS`] was assumed
    pub from_sample: bool,
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
}

impl ProbeReport {
    fn sampled(contract: &ColumnContract, columns: ColumnSet) -> Self {
        Self {
            contract_version: contract.version,
            missing_required: contract.missing_required(&columns),
            missing_optional: contract.missing_optional(&columns),
            columns,
            from_sample: true,
        }
    }

    fn assumed(contract: &ColumnContract) -> Self {
        let columns = column_set(ESSENTIAL_COLUMNS);
        Self {
            contract_version: contract.version,
            missing_required: Vec::new(),
            missing_optional: contract.missing_optional(&columns),
            columns,
            from_sample: false,
        }
    }

    /// Fail if the table lacks any required column.
    pub fn ensure_compatible(&self) -> Result<(), SchemaError> {
        if self.missing_required.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MigrationRequired {
                version: self.contract_version,
                missing: self.missing_required.clone(),
            })
        }
    }

    /// Keep only the keys present in the discovered column set.
    pub fn filter(&self, row: &Row) -> Row {
        row.iter()
            .filter(|(k, _)| self.columns.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Per-session cache of the remote column set.
///
/// Probing issues a single one-row select. A sampled result is kept until
/// [`SchemaProbe::reset`]; the empty-table fallback is not cached so the next
/// write probes again once rows exist.
#[derive(Debug, Default)]
pub struct SchemaProbe {
    contract: ColumnContract,
    cached: Mutex<Option<ProbeReport>>,
}

impl SchemaProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contract(contract: ColumnContract) -> Self {
        Self {
            contract,
            cached: Mutex::new(None),
        }
    }

    pub fn contract(&self) -> &ColumnContract {
        &self.contract
    }

    /// Discover the column set, using the cached result if there is one.
    pub fn probe<R: RemoteTable + ?Sized>(&self, remote: &R) -> RemoteResult<ProbeReport> {
        if let Some(report) = self.report() {
            return Ok(report);
        }

        let report = match remote.sample()? {
            Some(row) => {
                let report = ProbeReport::sampled(&self.contract, row.keys().cloned().collect());
                if !report.missing_required.is_empty() {
                    tracing::error!(
                        contract_version = report.contract_version,
                        missing = ?report.missing_required,
                        "remote patients table is missing required columns; migration required"
                    );
                } else if !report.missing_optional.is_empty() {
                    tracing::warn!(
                        missing = ?report.missing_optional,
                        "remote patients table lacks optional columns; they will not be sent"
                    );
                }
                *self.lock() = Some(report.clone());
                report
            }
            None => {
                tracing::debug!("remote patients table is empty, assuming essential columns");
                ProbeReport::assumed(&self.contract)
            }
        };

        Ok(report)
    }

    /// The cached report, if the table has been sampled this session.
    pub fn report(&self) -> Option<ProbeReport> {
        self.lock().clone()
    }

    /// Forget the discovered column set.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProbeReport>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryTable;
    use crate::schema::{OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn full_row() -> Row {
        let mut row = Row::new();
        for c in REQUIRED_COLUMNS.iter().chain(OPTIONAL_COLUMNS) {
            row.insert(c.to_string(), Value::Null);
        }
        row
    }

    /// Table lacking `column`, holding one row.
    fn table_without(column: &str) -> MemoryTable {
        let table = MemoryTable::with_columns(
            REQUIRED_COLUMNS
                .iter()
                .chain(OPTIONAL_COLUMNS)
                .filter(|c| **c != column)
                .copied(),
        );
        let mut row = full_row();
        row.remove(column);
        table.insert(&[row]).unwrap();
        table
    }

    #[test]
    fn test_probe_caches_sampled_result() {
        let table = MemoryTable::new();
        table.insert(&[full_row()]).unwrap();
        let probe = SchemaProbe::new();

        let first = probe.probe(&table).unwrap();
        let second = probe.probe(&table).unwrap();
        assert_eq!(first, second);
        assert!(first.from_sample);
        assert!(first.ensure_compatible().is_ok());
        assert_eq!(table.request_count(), 2); // insert + one sample

        probe.reset();
        probe.probe(&table).unwrap();
        assert_eq!(table.request_count(), 3);
    }

    #[test]
    fn test_empty_table_assumes_essentials_without_caching() {
        let table = MemoryTable::new();
        let probe = SchemaProbe::new();

        let report = probe.probe(&table).unwrap();
        assert!(!report.from_sample);
        assert!(report.columns.contains("image_url"));
        assert!(!report.columns.contains("treatment_intent"));
        assert!(probe.report().is_none());
    }

    #[test]
    fn test_missing_required_is_migration_error() {
        let table = table_without("vitals_history");

        let report = SchemaProbe::new().probe(&table).unwrap();
        assert_eq!(
            report.ensure_compatible(),
            Err(SchemaError::MigrationRequired {
                version: 2,
                missing: vec!["vitals_history".into()],
            })
        );
    }

    #[test]
    fn test_filter_drops_missing_column() {
        let table = table_without("clinical_notes");

        let report = SchemaProbe::new().probe(&table).unwrap();
        let outgoing = json!({"name": "A", "clinical_notes": [], "allergies": []});
        let filtered = report.filter(outgoing.as_object().unwrap());
        assert!(!filtered.contains_key("clinical_notes"));
        assert!(filtered.contains_key("allergies"));
        assert!(report.ensure_compatible().is_ok());
    }

    #[test]
    fn test_unreachable_probe_not_cached() {
        let table = MemoryTable::new();
        table.set_offline(true);
        let probe = SchemaProbe::new();
        assert!(probe.probe(&table).is_err());
        assert!(probe.report().is_none());
    }

    proptest! {
        #[test]
        fn prop_filter_keeps_only_known_columns(
            keys in proptest::collection::btree_set("[a-z_]{1,12}", 0..20),
            known in proptest::collection::btree_set("[a-z_]{1,12}", 0..20),
        ) {
            let report = ProbeReport {
                contract_version: 2,
                columns: known.clone(),
                from_sample: true,
                missing_required: vec![],
                missing_optional: vec![],
            };
            let row: Row = keys.iter().map(|k| (k.clone(), Value::from(k.len()))).collect();
            let filtered = report.filter(&row);

            for (k, v) in &filtered {
                prop_assert!(known.contains(k));
                prop_assert_eq!(Some(v), row.get(k));
            }
            let expected = keys.intersection(&known).count();
            prop_assert_eq!(filtered.len(), expected);
        }
    }
}
