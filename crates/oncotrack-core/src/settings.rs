//! Ward preferences.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult, SETTINGS_KEY};

/// Ward preferences, stored as one JSON value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct WardSettings {
    pub hospital_name: String,
    pub ward_id: String,
    pub notifications: bool,
    pub email_alerts: bool,
    pub dark_mode: bool,
    pub compact_view: bool,
}

impl Default for WardSettings {
    fn default() -> Self {
        Self {
            hospital_name: "General Oncology Ward".into(),
            ward_id: "Wing-3".into(),
            notifications: true,
            email_alerts: false,
            dark_mode: false,
            compact_view: false,
        }
    }
}

impl WardSettings {
    /// Stored settings, or defaults if none were saved or they are unreadable.
    pub fn load(db: &Database) -> DbResult<Self> {
        let Some(json) = db.get_item(SETTINGS_KEY)? else {
            return Ok(Self::default());
        };
        match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, "stored settings unreadable, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, db: &Database) -> DbResult<()> {
        db.set_item(SETTINGS_KEY, &serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unsaved() {
        let db = Database::open_in_memory().unwrap();
        let settings = WardSettings::load(&db).unwrap();
        assert_eq!(settings.hospital_name, "General Oncology Ward");
        assert_eq!(settings.ward_id, "Wing-3");
        assert!(settings.notifications);
        assert!(!settings.compact_view);
    }

    #[test]
    fn test_save_and_load() {
        let db = Database::open_in_memory().unwrap();
        let settings = WardSettings {
            ward_id: "Wing-5".into(),
            dark_mode: true,
            ..Default::default()
        };
        settings.save(&db).unwrap();
        assert_eq!(WardSettings::load(&db).unwrap(), settings);

        let stored = db.get_item(SETTINGS_KEY).unwrap().unwrap();
        assert!(stored.contains("\"wardId\":\"Wing-5\""));
    }

    #[test]
    fn test_partial_and_corrupt_values() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(SETTINGS_KEY, r#"{"darkMode": true}"#).unwrap();
        let settings = WardSettings::load(&db).unwrap();
        assert!(settings.dark_mode);
        assert_eq!(settings.ward_id, "Wing-3");

        db.set_item(SETTINGS_KEY, "not json").unwrap();
        assert_eq!(WardSettings::load(&db).unwrap(), WardSettings::default());
    }
}
