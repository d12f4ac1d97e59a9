//! Unified error hierarchy for effortrs
//!
//! The scoring engine itself only ever fails with [`EffortError::InvalidArgument`];
//! the remaining variants belong to the import, configuration and CLI surfaces.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all effortrs operations
#[derive(Debug, Error)]
pub enum EffortError {
    /// A caller-supplied argument is outside the accepted domain
    #[error("Invalid argument {parameter}={value}: {reason}")]
    InvalidArgument {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Sample import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Heart-rate sample import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported file extension
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// A row or document could not be parsed
    #[error("Parse error in {format} at record {record}: {reason}")]
    ParseError {
        format: String,
        record: usize,
        reason: String,
    },

    /// Required column missing from the CSV header
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },
}

/// Result type alias for effortrs operations
pub type Result<T> = std::result::Result<T, EffortError>;

impl EffortError {
    /// Shorthand for building an [`EffortError::InvalidArgument`]
    pub fn invalid_argument(
        parameter: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        EffortError::InvalidArgument {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EffortError::InvalidArgument { .. } => ErrorSeverity::Warning,
            EffortError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            EffortError::Import(_) => ErrorSeverity::Error,
            EffortError::Configuration(_) => ErrorSeverity::Error,
            EffortError::Io(_) => ErrorSeverity::Error,
            EffortError::Serialization(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            EffortError::InvalidArgument {
                parameter, reason, ..
            } => {
                format!("The value given for {} was rejected: {}", parameter, reason)
            }
            EffortError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find heart-rate file: {}", path.display())
            }
            EffortError::Configuration(_) => {
                "Unable to determine settings. Please check your configuration file.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = EffortError::invalid_argument("max_heart_rate", 0, "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid argument max_heart_rate=0: must be positive"
        );
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_severity() {
        let err = EffortError::Import(ImportError::UnsupportedFormat {
            format: "fit".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);

        let err = EffortError::Import(ImportError::FileNotFound {
            path: PathBuf::from("/tmp/missing.csv"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_user_messages() {
        let err = EffortError::Import(ImportError::FileNotFound {
            path: PathBuf::from("session.csv"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err = EffortError::invalid_argument("duration_seconds", -5.0, "must not be negative");
        assert!(err.user_message().contains("duration_seconds"));
    }

    #[test]
    fn test_error_found_through_context_chain() {
        let err = anyhow::Error::from(EffortError::Configuration("no max".to_string()))
            .context("Failed to resolve maximum heart rate");

        let inner = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<EffortError>())
            .unwrap();
        assert_eq!(inner.severity(), ErrorSeverity::Error);
        assert!(inner.user_message().contains("configuration file"));
    }
}
