//! Run-level error taxonomy.
//!
//! Only configuration and report persistence failures live here: they abort
//! the whole run. Per-scene render and comparison failures are carried as
//! data on the records and degrade to a score of zero.

use std::path::PathBuf;

/// Fatal regrade errors.
#[derive(Debug, thiserror::Error)]
pub enum RegradeError {
    #[error("{what} does not exist: {}", path.display())]
    MissingPath { what: &'static str, path: PathBuf },

    #[error("output location already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    #[error("invalid catalog: {0}")]
    Catalog(String),

    #[error("failed to write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegradeError {
    /// Whether this error was raised before any scene ran.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RegradeError::MissingPath { .. }
                | RegradeError::OutputExists { .. }
                | RegradeError::Catalog(_)
        )
    }
}

/// Result type for regrade operations.
pub type Result<T> = std::result::Result<T, RegradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_display() {
        let err = RegradeError::MissingPath {
            what: "renderer executable",
            path: PathBuf::from("/nope/render"),
        };
        let msg = err.to_string();
        assert!(msg.contains("renderer executable"));
        assert!(msg.contains("/nope/render"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_output_exists_is_configuration() {
        let err = RegradeError::OutputExists {
            path: PathBuf::from("out"),
        };
        assert!(err.to_string().contains("already exists"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_report_write_is_not_configuration() {
        let err = RegradeError::ReportWrite {
            path: PathBuf::from("report.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("report.html"));
        assert!(!err.is_configuration());
    }
}
