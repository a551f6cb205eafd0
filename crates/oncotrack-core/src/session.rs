//! Login session.
//!
//! A single shared credential gates the ward views. This is a UI gate, not
//! identity management.

use thiserror::Error;

use crate::config::LoginConfig;
use crate::db::{Database, DbError, AUTH_KEY};
use crate::schema::SchemaProbe;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Please enter your Doctor ID and Password")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Local(#[from] DbError),
}

/// Whether the ward views are unlocked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    doctor_id: Option<String>,
}

impl Session {
    /// Resume a session persisted by an earlier login.
    pub fn restore(db: &Database) -> Result<Self, SessionError> {
        let doctor_id = db.get_item(AUTH_KEY)?.filter(|id| !id.is_empty());
        Ok(Self { doctor_id })
    }

    pub fn is_authenticated(&self) -> bool {
        self.doctor_id.is_some()
    }

    pub fn doctor_id(&self) -> Option<&str> {
        self.doctor_id.as_deref()
    }

    pub fn login(
        &mut self,
        db: &Database,
        credentials: &LoginConfig,
        doctor_id: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        let doctor_id = doctor_id.trim();
        if doctor_id.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        if doctor_id != credentials.doctor_id || password != credentials.password {
            tracing::warn!(doctor_id, "rejected login");
            return Err(SessionError::InvalidCredentials);
        }

        db.set_item(AUTH_KEY, doctor_id)?;
        self.doctor_id = Some(doctor_id.to_string());
        tracing::info!(doctor_id, "logged in");
        Ok(())
    }

    /// End the session and forget per-session remote state.
    pub fn logout(&mut self, db: &Database, probe: &SchemaProbe) -> Result<(), SessionError> {
        db.remove_item(AUTH_KEY)?;
        probe.reset();
        self.doctor_id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_messages() {
        let db = Database::open_in_memory().unwrap();
        let creds = LoginConfig::default();
        let mut session = Session::default();

        let err = session.login(&db, &creds, "  ", "123456").unwrap_err();
        assert_eq!(err.to_string(), "Please enter your Doctor ID and Password");

        let err = session.login(&db, &creds, "docid", "wrong").unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_persists_until_logout() {
        let db = Database::open_in_memory().unwrap();
        let probe = SchemaProbe::new();
        let mut session = Session::default();

        session
            .login(&db, &LoginConfig::default(), "docid", "123456")
            .unwrap();
        let resumed = Session::restore(&db).unwrap();
        assert!(resumed.is_authenticated());
        assert_eq!(resumed.doctor_id(), Some("docid"));

        session.logout(&db, &probe).unwrap();
        assert!(!session.is_authenticated());
        assert!(!Session::restore(&db).unwrap().is_authenticated());
    }
}
