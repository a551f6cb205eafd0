//! Remote `patients` table access.

mod memory;
mod rest;
mod row;

pub use memory::*;
pub use rest::*;
pub use row::*;

use thiserror::Error;

/// Remote table errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Network failure, timeout, or the backend is down.
    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with an error.
    #[error("Remote rejected request (HTTP {status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Could not decode remote response: {0}")]
    Decode(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Error codes that mean the table does not have a column we sent.
const SCHEMA_ERROR_CODES: &[&str] = &["PGRST204", "42703"];

impl RemoteError {
    /// True when the backend rejected a request because of an unknown column.
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            RemoteError::Rejected { code, message, .. } => {
                if code
                    .as_deref()
                    .is_some_and(|c| SCHEMA_ERROR_CODES.contains(&c))
                {
                    return true;
                }
                let msg = message.to_lowercase();
                msg.contains("column")
                    && (msg.contains("does not exist")
                        || msg.contains("could not find")
                        || msg.contains("schema cache"))
            }
            _ => false,
        }
    }

    /// True when the error message names `column`.
    pub fn mentions_column(&self, column: &str) -> bool {
        match self {
            RemoteError::Rejected { message, .. } => {
                message.to_lowercase().contains(&column.to_lowercase())
            }
            _ => false,
        }
    }

    /// The subset of `candidates` this error names.
    pub fn mentioned_columns<'c>(&self, candidates: &[&'c str]) -> Vec<&'c str> {
        candidates
            .iter()
            .copied()
            .filter(|c| self.mentions_column(c))
            .collect()
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, RemoteError::Unreachable(_))
    }

    /// True when resending the same request cannot succeed: a client error
    /// (constraint, permission, malformed id) that is not a missing column,
    /// a timeout or rate limiting.
    pub fn is_permanent(&self) -> bool {
        match self {
            RemoteError::Rejected { status, .. } => {
                (400..500).contains(status)
                    && !matches!(status, 408 | 429)
                    && !self.is_schema_mismatch()
            }
            _ => false,
        }
    }
}

/// Row-level access to the remote `patients` table.
pub trait RemoteTable {
    /// All rows, newest first.
    fn select_all(&self) -> RemoteResult<Vec<Row>>;

    /// A single row by id.
    fn select_one(&self, id: &str) -> RemoteResult<Option<Row>>;

    /// At most one row, used to discover the column set.
    fn sample(&self) -> RemoteResult<Option<Row>>;

    /// Insert rows and return them as stored (with assigned ids).
    fn insert(&self, rows: &[Row]) -> RemoteResult<Vec<Row>>;

    /// Update the row with `id`; returns the stored row if one matched.
    fn update(&self, id: &str, row: &Row) -> RemoteResult<Option<Row>>;

    fn delete(&self, id: &str) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(code: Option<&str>, message: &str) -> RemoteError {
        RemoteError::Rejected {
            status: 400,
            code: code.map(String::from),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_schema_mismatch_by_code() {
        assert!(rejected(Some("PGRST204"), "whatever").is_schema_mismatch());
        assert!(rejected(Some("42703"), "whatever").is_schema_mismatch());
        assert!(!rejected(Some("23505"), "duplicate key").is_schema_mismatch());
    }

    #[test]
    fn test_schema_mismatch_by_message() {
        let err = rejected(
            None,
            "Could not find the 'image_url' column of 'patients' in the schema cache",
        );
        assert!(err.is_schema_mismatch());
        assert!(err.mentions_column("image_url"));
        assert!(!err.mentions_column("clinical_notes"));

        let err = rejected(None, "column \"clinical_notes\" does not exist");
        assert!(err.is_schema_mismatch());
        assert!(err.mentions_column("clinical_notes"));
    }

    #[test]
    fn test_permanent_refusals() {
        let duplicate = RemoteError::Rejected {
            status: 409,
            code: Some("23505".into()),
            message: "duplicate key value violates unique constraint".into(),
        };
        assert!(duplicate.is_permanent());
        assert!(rejected(Some("22P02"), "invalid input syntax for type bigint").is_permanent());

        assert!(!rejected(Some("PGRST204"), "whatever").is_permanent());
        let throttled = RemoteError::Rejected {
            status: 429,
            code: None,
            message: "too many requests".into(),
        };
        assert!(!throttled.is_permanent());
        assert!(!RemoteError::Unreachable("timeout".into()).is_permanent());
    }

    #[test]
    fn test_unreachable_is_not_schema() {
        let err = RemoteError::Unreachable("connection refused".into());
        assert!(!err.is_schema_mismatch());
        assert!(!err.mentions_column("connection"));
        assert!(err.is_unreachable());
    }
}
