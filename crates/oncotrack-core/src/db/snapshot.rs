//! Local snapshot cache of the patient list.
//!
//! The whole list is stored as one JSON blob under [`PATIENTS_KEY`]. Every
//! change rewrites the blob; the working set is one ward's roster.

use super::{Database, DbResult, PATIENTS_KEY};
use crate::fixtures::ward_fixtures;
use crate::models::Patient;

impl Database {
    /// Check whether a snapshot has ever been written.
    pub fn has_snapshot(&self) -> DbResult<bool> {
        Ok(self.get_item(PATIENTS_KEY)?.is_some())
    }

    /// Read the cached patient list, seeding bundled fixtures on first use.
    pub fn read_snapshot(&self) -> DbResult<Vec<Patient>> {
        match self.get_item(PATIENTS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                let fixtures = ward_fixtures();
                tracing::info!(count = fixtures.len(), "seeding local cache with fixtures");
                self.write_snapshot(&fixtures)?;
                Ok(fixtures)
            }
        }
    }

    /// Overwrite the cached patient list.
    pub fn write_snapshot(&self, patients: &[Patient]) -> DbResult<()> {
        let json = serde_json::to_string(patients)?;
        self.set_item(PATIENTS_KEY, &json)
    }

    /// Get a cached patient by id.
    pub fn get_cached(&self, id: &str) -> DbResult<Option<Patient>> {
        Ok(self.read_snapshot()?.into_iter().find(|p| p.id == id))
    }

    /// Replace the cached patient with the same id, or add it as newest.
    pub fn upsert_cached(&self, patient: &Patient) -> DbResult<()> {
        let mut patients = self.read_snapshot()?;
        match patients.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => *existing = patient.clone(),
            None => patients.insert(0, patient.clone()),
        }
        self.write_snapshot(&patients)
    }

    /// Remove a cached patient. Returns whether it was present.
    pub fn remove_cached(&self, id: &str) -> DbResult<bool> {
        let mut patients = self.read_snapshot()?;
        let before = patients.len();
        patients.retain(|p| p.id != id);
        let removed = patients.len() != before;
        if removed {
            self.write_snapshot(&patients)?;
        }
        Ok(removed)
    }

    /// Replace a client-generated id with the id the remote assigned.
    pub fn remap_cached_id(&self, old_id: &str, new_id: &str) -> DbResult<bool> {
        let mut patients = self.read_snapshot()?;
        let mut changed = false;
        for patient in patients.iter_mut().filter(|p| p.id == old_id) {
            patient.id = new_id.to_string();
            changed = true;
        }
        if changed {
            self.write_snapshot(&patients)?;
        }
        Ok(changed)
    }
}
