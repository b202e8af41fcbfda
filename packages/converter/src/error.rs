//! Error types for the converter.
//!
//! Only structural failures surface as `ConverterError`: unreadable input,
//! a reference repository that does not deserialize, invalid configuration,
//! or a failed write. Everything the builder can recover from (unresolved
//! references, malformed cells, duplicate definitions, unknown sections) is
//! recorded in [`crate::diagnostics::Diagnostics`] instead.

use thiserror::Error;

/// Main error type for the converter library.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Id range where the minimum is not below the maximum.
    #[error("Invalid id range: minimum {min} must be below maximum {max}")]
    InvalidIdRange { min: u32, max: u32 },

    /// Copy depth that is neither a number nor `unbounded`.
    #[error("Invalid copy depth: '{0}'. Expected a number or 'unbounded'")]
    InvalidDepth(String),

    /// Column alias not in `HEADING=key` form.
    #[error("Invalid column alias: '{0}'. Expected HEADING=key (e.g., Code=value)")]
    InvalidAlias(String),

    /// Alias target that is not a known column key.
    #[error("Unknown column key '{0}'")]
    UnknownColumnKey(String),

    /// Reference repository could not be loaded.
    #[error("Failed to load reference repository {path}: {source}")]
    ReferenceLoad {
        path: String,
        #[source]
        source: Box<ConverterError>,
    },

    /// Build finished with more errors than the caller allows.
    #[error("Conversion reported {count} errors, more than the allowed {limit}")]
    TooManyErrors { count: usize, limit: usize },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ConverterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConverterError::InvalidIdRange { min: 10, max: 5 };
        assert_eq!(
            err.to_string(),
            "Invalid id range: minimum 10 must be below maximum 5"
        );
    }

    #[test]
    fn test_reference_load_wraps_source() {
        let inner = ConverterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = ConverterError::ReferenceLoad {
            path: "ref.yaml".to_string(),
            source: Box::new(inner),
        };
        assert!(err.to_string().starts_with("Failed to load reference repository ref.yaml"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_too_many_errors_display() {
        let err = ConverterError::TooManyErrors { count: 3, limit: 0 };
        assert!(err.to_string().contains("3 errors"));
    }
}
