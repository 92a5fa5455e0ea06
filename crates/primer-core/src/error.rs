//! Error types for Primer

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Primer operations
#[derive(Debug, Error)]
pub enum PrimerError {
    /// Missing or invalid credentials/configuration. Fatal, raised before any work starts.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The catalog file exists but is not a well-formed entity array. Fatal.
    #[error("Corrupt catalog {path}: {reason}")]
    CorruptCatalog { path: PathBuf, reason: String },

    /// A provider returned no usable payload. Recoverable per field group.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// An asynchronous provider task exceeded its poll budget. Recoverable per field group.
    #[error("Generation timed out after {attempts} poll attempts: {detail}")]
    GenerationTimeout { attempts: u32, detail: String },

    /// Writing the catalog failed. Fatal: the run must not diverge from disk.
    #[error("Failed to persist catalog {path}: {reason}")]
    PersistenceError { path: PathBuf, reason: String },

    /// Asset read/delete failure during reconciliation or validation. Logged and counted.
    #[error("File system error on {path}: {reason}")]
    FileSystemError { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for Primer operations
pub type Result<T> = std::result::Result<T, PrimerError>;

impl PrimerError {
    /// Whether this error must abort a whole run rather than a single unit of work
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PrimerError::ConfigurationError(_)
                | PrimerError::CorruptCatalog { .. }
                | PrimerError::PersistenceError { .. }
        )
    }

    /// Whether a provider call failed in a way the runner counts and moves past
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            PrimerError::GenerationFailure(_) | PrimerError::GenerationTimeout { .. }
        )
    }

    pub fn file_system<P: Into<PathBuf>>(path: P, err: impl std::fmt::Display) -> Self {
        PrimerError::FileSystemError {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub fn persistence<P: Into<PathBuf>>(path: P, err: impl std::fmt::Display) -> Self {
        PrimerError::PersistenceError {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PrimerError {
    fn from(err: serde_json::Error) -> Self {
        PrimerError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for PrimerError {
    fn from(err: toml::de::Error) -> Self {
        PrimerError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(PrimerError::ConfigurationError("no keys".into()).is_fatal());
        assert!(PrimerError::persistence("catalog.json", "disk full").is_fatal());
        assert!(PrimerError::CorruptCatalog {
            path: "catalog.json".into(),
            reason: "expected array".into(),
        }
        .is_fatal());

        assert!(!PrimerError::GenerationFailure("empty".into()).is_fatal());
        assert!(!PrimerError::GenerationTimeout {
            attempts: 3,
            detail: "task-1".into(),
        }
        .is_fatal());
        assert!(!PrimerError::file_system("a.jpg", "denied").is_fatal());
    }

    #[test]
    fn test_generation_error_classification() {
        assert!(PrimerError::GenerationFailure("x".into()).is_generation_error());
        assert!(PrimerError::GenerationTimeout {
            attempts: 1,
            detail: "t".into(),
        }
        .is_generation_error());
        assert!(!PrimerError::ConfigurationError("x".into()).is_generation_error());
    }

    #[test]
    fn test_display_includes_path() {
        let err = PrimerError::file_system("assets/images/a.jpg", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("assets/images/a.jpg"));
        assert!(msg.contains("permission denied"));
    }
}
