//! Mapping between remote `patients` rows and [`Patient`].
//!
//! Remote rows use snake_case columns with the structured fields
//! (`radiation_plan`, `chemo_protocol`, `vitals_history`, `allergies`,
//! `clinical_notes`) embedded as JSON values.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::{avatar_url, Gender, Patient, PatientStatus, TreatmentIntent};

/// A remote row as a JSON object.
pub type Row = Map<String, Value>;

/// Build the outgoing row for a patient. The `id` column is never written;
/// the remote assigns it on insert and it is the filter on update.
pub fn patient_to_row(patient: &Patient) -> Row {
    let mut row = Row::new();
    row.insert("mrn".into(), Value::from(patient.mrn.clone()));
    row.insert("name".into(), Value::from(patient.name.clone()));
    row.insert("age".into(), Value::from(patient.age));
    row.insert("gender".into(), Value::from(patient.gender.as_str()));
    row.insert("admission_date".into(), Value::from(patient.admission_date.clone()));
    row.insert("discharge_date".into(), opt_string(&patient.discharge_date));
    row.insert("diagnosis".into(), Value::from(patient.diagnosis.clone()));
    row.insert("stage".into(), Value::from(patient.stage.clone()));
    row.insert("room_number".into(), Value::from(patient.room_number.clone()));
    row.insert("status".into(), Value::from(patient.status.as_str()));
    row.insert(
        "attending_physician".into(),
        Value::from(patient.attending_physician.clone()),
    );
    row.insert(
        "treatment_intent".into(),
        patient
            .treatment_intent
            .map(|i| serde_json::to_value(i).unwrap_or(Value::Null))
            .unwrap_or(Value::Null),
    );
    row.insert("radiation_plan".into(), to_json_or_null(&patient.radiation_plan));
    row.insert("chemo_protocol".into(), to_json_or_null(&patient.chemo_protocol));
    row.insert("vitals_history".into(), to_json_or_null(&patient.vitals_history));
    row.insert("allergies".into(), to_json_or_null(&patient.allergies));
    row.insert("clinical_notes".into(), to_json_or_null(&patient.clinical_notes));
    let image_url = if patient.image_url.trim().is_empty() {
        avatar_url(&patient.name)
    } else {
        patient.image_url.clone()
    };
    row.insert("image_url".into(), Value::from(image_url));
    row.insert("updated_at".into(), opt_string(&patient.updated_at));
    row
}

/// Map a remote row to a patient, substituting defaults for anything
/// missing or null.
pub fn row_to_patient(row: &Row) -> Patient {
    let name = str_field(row, "name");
    let image_url = match row.get("image_url").and_then(Value::as_str) {
        Some(url) if !url.trim().is_empty() => url.to_string(),
        _ => avatar_url(&name),
    };

    let status = row
        .get("status")
        .and_then(Value::as_str)
        .and_then(PatientStatus::parse)
        .unwrap_or_default();

    Patient {
        id: row_id(row).unwrap_or_default(),
        mrn: str_field(row, "mrn"),
        name,
        age: row
            .get("age")
            .and_then(Value::as_u64)
            .map(|a| a as u32)
            .unwrap_or(0),
        gender: Gender::parse(&str_field(row, "gender")),
        admission_date: str_field(row, "admission_date"),
        discharge_date: opt_str_field(row, "discharge_date"),
        stage: str_field(row, "stage"),
        diagnosis: str_field(row, "diagnosis"),
        room_number: str_field(row, "room_number"),
        attending_physician: str_field(row, "attending_physician"),
        status,
        allergies: json_field(row, "allergies").unwrap_or_default(),
        treatment_intent: row
            .get("treatment_intent")
            .and_then(Value::as_str)
            .and_then(TreatmentIntent::parse),
        radiation_plan: json_field(row, "radiation_plan"),
        chemo_protocol: json_field(row, "chemo_protocol"),
        vitals_history: json_field(row, "vitals_history").unwrap_or_default(),
        clinical_notes: json_field(row, "clinical_notes").unwrap_or_default(),
        image_url,
        updated_at: opt_str_field(row, "updated_at"),
    }
}

/// The row id as a string. Remote ids may be numeric.
pub fn row_id(row: &Row) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_field(row: &Row, key: &str) -> String {
    opt_str_field(row, key).unwrap_or_default()
}

fn opt_str_field(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode an embedded JSON column. Malformed values decode as absent.
fn json_field<T: DeserializeOwned>(row: &Row, key: &str) -> Option<T> {
    let value = row.get(key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(column = key, error = %e, "malformed embedded column, using default");
            None
        }
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::from).unwrap_or(Value::Null)
}

fn to_json_or_null<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_defaults() {
        let row = json!({
            "id": 42,
            "mrn": "ONC-9",
            "name": "Nadia Haddad",
            "admission_date": "2024-04-01",
            "diagnosis": "Hodgkin Lymphoma",
            "status": "Critical",
            "radiation_plan": null,
            "vitals_history": null,
            "image_url": null
        });
        let patient = row_to_patient(row.as_object().unwrap());
        assert_eq!(patient.id, "42");
        assert_eq!(patient.status, PatientStatus::Critical);
        assert!(patient.radiation_plan.is_none());
        assert!(patient.vitals_history.is_empty());
        assert!(patient.allergies.is_empty());
        assert!(patient.image_url.contains("name=Nadia+Haddad"));
    }

    #[test]
    fn test_unknown_status_defaults_to_stable() {
        let row = json!({"id": "a", "name": "X", "status": "Transferred"});
        let patient = row_to_patient(row.as_object().unwrap());
        assert_eq!(patient.status, PatientStatus::Stable);
    }

    #[test]
    fn test_outgoing_row_shape() {
        let mut patient = Patient::new("Ivo Petrov".into(), "M-3".into(), "Melanoma".into());
        patient.image_url.clear();
        let row = patient_to_row(&patient);

        assert!(!row.contains_key("id"));
        assert_eq!(row["radiation_plan"], Value::Null);
        assert_eq!(row["vitals_history"], json!([]));
        assert_eq!(row["clinical_notes"], json!([]));
        assert_eq!(row["status"], "Stable");
        assert!(row["image_url"].as_str().unwrap().contains("Ivo+Petrov"));
    }

    #[test]
    fn test_row_mapping_preserves_patient() {
        let mut patient = Patient::new("Rosa Lind".into(), "M-4".into(), "Cervical".into());
        patient.allergies = vec!["Latex".into()];
        patient.treatment_intent = Some(TreatmentIntent::Palliative);

        let mut row = patient_to_row(&patient);
        row.insert("id".into(), Value::from(patient.id.clone()));
        assert_eq!(row_to_patient(&row), patient);
    }
}
