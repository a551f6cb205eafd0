//! Vitals and clinical note models.

use serde::{Deserialize, Serialize};

/// A single vitals reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSign {
    /// `YYYY-MM-DD`
    pub date: String,
    pub systolic: u32,
    pub diastolic: u32,
    pub heart_rate: u32,
    /// Degrees Celsius
    pub temp: f64,
    pub spo2: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NoteType {
    #[default]
    General,
    Pathology,
    Imaging,
}

impl NoteType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "general" => Some(Self::General),
            "pathology" => Some(Self::Pathology),
            "imaging" => Some(Self::Imaging),
            _ => None,
        }
    }
}

/// A timestamped, authored clinical note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalNote {
    pub id: String,
    /// RFC 3339 timestamp
    pub date: String,
    pub content: String,
    #[serde(default, rename = "type")]
    pub note_type: NoteType,
    pub author: String,
}

impl ClinicalNote {
    pub fn new(content: String, note_type: NoteType, author: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: chrono::Utc::now().to_rfc3339(),
            content,
            note_type,
            author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_type_wire_name() {
        let note = ClinicalNote::new("CT ordered".into(), NoteType::Imaging, "Dr. Osei".into());
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "Imaging");
        assert_eq!(note.id.len(), 36);
    }

    #[test]
    fn test_note_type_parse() {
        assert_eq!(NoteType::parse("PATHOLOGY"), Some(NoteType::Pathology));
        assert_eq!(NoteType::parse("radiology"), None);
    }
}
