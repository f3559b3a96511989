//! Custom error types for the Perimeter engine.
//!
//! Provides a structured error hierarchy so callers can tell a retryable
//! upstream outage apart from bad input or a broken configuration.

use std::path::PathBuf;

/// The main error type for Perimeter operations.
#[derive(Debug, thiserror::Error)]
pub enum PerimeterError {
    /// Domain failed format validation before any work was attempted
    #[error("Invalid domain format: '{0}'")]
    InvalidDomain(String),

    /// Requested scan id does not exist in the store
    #[error("Scan not found: {0}")]
    ScanNotFound(String),

    /// An external collaborator (collector, enrichment model) failed.
    /// Distinct from "no risk found" — callers may retry when `retryable`.
    #[error("Upstream service '{service}' unavailable: {message}")]
    Upstream {
        service: String,
        message: String,
        retryable: bool,
    },

    /// A fixed scoring table violates its structural invariants.
    /// Raised at engine construction, never at request time.
    #[error("Computation invariant violated: {0}")]
    Invariant(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (report export, inventory read)
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using PerimeterError
pub type PerimeterResult<T> = Result<T, PerimeterError>;

impl PerimeterError {
    /// Create an upstream error for a failed external collaborator
    pub fn upstream(service: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
            retryable,
        }
    }

    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { retryable: true, .. })
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for PerimeterError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = PerimeterError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            Some(PathBuf::from("/test/report.json")),
        );
        assert!(err.to_string().contains("/test/report.json"));
    }

    #[test]
    fn test_upstream_retryable() {
        let err = PerimeterError::upstream("collector", "connection refused", true);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("collector"));

        let fatal = PerimeterError::upstream("enrichment", "not configured", false);
        assert!(!fatal.is_retryable());
    }

    #[test]
    fn test_invariant_not_retryable() {
        let err = PerimeterError::Invariant("overlapping severity thresholds".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let perimeter_err: PerimeterError = io_err.into();
        matches!(perimeter_err, PerimeterError::Io { .. });
    }
}
