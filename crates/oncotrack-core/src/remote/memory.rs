//! In-process `patients` table.
//!
//! Behaves like the hosted table closely enough to exercise fallback paths:
//! it can be switched offline, and it rejects columns outside its configured
//! column set with the same error the hosted backend returns.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde_json::Value;

use super::{row_id, RemoteError, RemoteResult, RemoteTable, Row};
use crate::schema::{OPTIONAL_COLUMNS, REQUIRED_COLUMNS};

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Row>,
    next_id: u64,
    offline: bool,
    columns: BTreeSet<String>,
    requests: usize,
}

/// In-memory table for tests and demo shells.
#[derive(Debug)]
pub struct MemoryTable {
    state: Mutex<TableState>,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTable {
    /// Table with every column the current client writes.
    pub fn new() -> Self {
        Self::with_columns(REQUIRED_COLUMNS.iter().chain(OPTIONAL_COLUMNS).copied())
    }

    /// Table that only has the given columns (plus `id` and `created_at`).
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = columns.into_iter().map(Into::into).collect();
        set.insert("id".into());
        set.insert("created_at".into());
        Self {
            state: Mutex::new(TableState {
                columns: set,
                ..Default::default()
            }),
        }
    }

    /// Simulate losing or regaining connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Copy of the stored rows, oldest first.
    pub fn rows(&self) -> Vec<Row> {
        self.lock().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of requests served or refused so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }

    /// Modify a stored row directly, bypassing column checks.
    /// Simulates another client editing the same record.
    pub fn edit_row<F: FnOnce(&mut Row)>(&self, id: &str, f: F) -> bool {
        let mut state = self.lock();
        match state
            .rows
            .iter_mut()
            .find(|r| row_id(r).as_deref() == Some(id))
        {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableState> {
        // A panicking test thread must not take the table down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> RemoteResult<std::sync::MutexGuard<'_, TableState>> {
        let mut state = self.lock();
        state.requests += 1;
        if state.offline {
            return Err(RemoteError::Unreachable("connection refused".into()));
        }
        Ok(state)
    }
}

fn check_columns(columns: &BTreeSet<String>, row: &Row) -> RemoteResult<()> {
    match row.keys().find(|k| !columns.contains(*k)) {
        Some(unknown) => Err(RemoteError::Rejected {
            status: 400,
            code: Some("PGRST204".into()),
            message: format!(
                "Could not find the '{}' column of 'patients' in the schema cache",
                unknown
            ),
        }),
        None => Ok(()),
    }
}

/// Fill in configured columns the row never set, as the hosted table
/// returns every column with `null` defaults.
fn project(columns: &BTreeSet<String>, row: &Row) -> Row {
    let mut row = row.clone();
    for column in columns {
        row.entry(column.clone()).or_insert(Value::Null);
    }
    row
}

impl RemoteTable for MemoryTable {
    fn select_all(&self) -> RemoteResult<Vec<Row>> {
        let state = self.begin()?;
        // Rows are appended in creation order
        Ok(state
            .rows
            .iter()
            .rev()
            .map(|r| project(&state.columns, r))
            .collect())
    }

    fn select_one(&self, id: &str) -> RemoteResult<Option<Row>> {
        let state = self.begin()?;
        Ok(state
            .rows
            .iter()
            .find(|r| row_id(r).as_deref() == Some(id))
            .map(|r| project(&state.columns, r)))
    }

    fn sample(&self) -> RemoteResult<Option<Row>> {
        let state = self.begin()?;
        Ok(state.rows.first().map(|r| project(&state.columns, r)))
    }

    fn insert(&self, rows: &[Row]) -> RemoteResult<Vec<Row>> {
        let mut state = self.begin()?;
        for row in rows {
            check_columns(&state.columns, row)?;
        }

        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            state.next_id += 1;
            let mut row = row.clone();
            row.insert("id".into(), Value::from(state.next_id));
            row.insert(
                "created_at".into(),
                Value::from(chrono::Utc::now().to_rfc3339()),
            );
            stored.push(project(&state.columns, &row));
            state.rows.push(row);
        }
        Ok(stored)
    }

    fn update(&self, id: &str, row: &Row) -> RemoteResult<Option<Row>> {
        let mut state = self.begin()?;
        check_columns(&state.columns, row)?;

        let state = &mut *state;
        match state
            .rows
            .iter_mut()
            .find(|r| row_id(r).as_deref() == Some(id))
        {
            Some(existing) => {
                for (k, v) in row {
                    existing.insert(k.clone(), v.clone());
                }
                Ok(Some(project(&state.columns, existing)))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: &str) -> RemoteResult<()> {
        let mut state = self.begin()?;
        state.rows.retain(|r| row_id(r).as_deref() != Some(id));
        Ok(())
    }
}
