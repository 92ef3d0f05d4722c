/*!
Error types for the FileStore core engine.
*/

use thiserror::Error;

/// Result type used throughout the FileStore core.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage and codec operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Path or artifact absent after resolution
    #[error("not found: {0}")]
    NotFound(String),

    /// No codec registered for the requested kind/format pair
    #[error("unsupported format: no {kind} codec for '{format}'")]
    UnsupportedFormat { kind: String, format: String },

    /// Payload shape mismatched to the selected codec
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Missing role mapping, malformed settings, ambiguous path arguments
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Remote backend unreachable (at construction or after retry exhaustion)
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Non-transient storage operation failure
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StoreError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new invalid-payload error
    pub fn invalid_payload<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new backend-unavailable error
    pub fn backend_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// True when the error means the requested artifact does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = StoreError::UnsupportedFormat {
            kind: "tabular".into(),
            format: "docx".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported format: no tabular codec for 'docx'"
        );

        let err = StoreError::not_found("data/raw/report.csv");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("report.csv"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
