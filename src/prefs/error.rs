//! Preference store error types

use thiserror::Error;

/// Errors that can occur while reading or writing preferences
///
/// These never reach callers of [`super::Preferences`]; they are logged and
/// absorbed there. Backends still return them so failures are observable in
/// isolation.
#[derive(Error, Debug)]
pub enum PrefsError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized or the stored document is malformed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend lock was poisoned
    #[error("Lock error: {0}")]
    Lock(String),

    /// Backend refused the write
    #[error("Write rejected: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for PrefsError {
    fn from(err: serde_json::Error) -> Self {
        PrefsError::Serialization(err.to_string())
    }
}

/// Result type alias for preference backends
pub type PrefsResult<T> = Result<T, PrefsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrefsError::Lock("poisoned".to_string());
        assert_eq!(err.to_string(), "Lock error: poisoned");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err: PrefsError = json_err.into();
        assert!(matches!(err, PrefsError::Serialization(_)));
    }
}
