/// Error taxonomy for the archiver
use crate::columns::ColumnRole;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveError {
    /// A header marker the operation depends on is absent from the table
    #[error("Required column missing: {role}")]
    MissingColumn { role: ColumnRole },

    /// The row's identity cells are empty or unreadable
    #[error("Invalid row identity: {reason}")]
    InvalidIdentity { reason: String },

    /// The persisted store rejected a read or a write
    #[error("Storage failure: {reason}")]
    Store { reason: String },

    #[error("Unrecognized timestamp: {input:?}")]
    InvalidTimestamp { input: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl ArchiveError {
    pub fn store(reason: impl Into<String>) -> Self {
        ArchiveError::Store {
            reason: reason.into(),
        }
    }

    pub fn invalid_identity(reason: impl Into<String>) -> Self {
        ArchiveError::InvalidIdentity {
            reason: reason.into(),
        }
    }
}

impl From<ArchiveError> for JsValue {
    fn from(err: ArchiveError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}
