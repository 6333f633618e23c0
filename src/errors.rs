//! Run-aborting error types.
//!
//! Only the conditions that stop a run before any file is touched live here:
//! bad configuration, an unusable analyzer, or an unreadable repository.
//! Everything that happens per file or per issue (regressions, rate limits,
//! assistant failures, persistence hiccups) is carried as data in the run
//! summary instead, see [`crate::orchestrator::FixOutcome`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        path: Option<PathBuf>,
    },

    /// The external analyzer could not run or produced unparseable output
    #[error("Analyzer {analyzer} unavailable: {message}")]
    AnalyzerUnavailable { analyzer: String, message: String },

    /// The repository directory cannot be read
    #[error("Cannot read repository {}: {message}", path.display())]
    RepositoryUnreadable { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            path: None,
        }
    }

    pub fn configuration_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Configuration {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn analyzer(analyzer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AnalyzerUnavailable {
            analyzer: analyzer.into(),
            message: message.into(),
        }
    }

    pub fn repository(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RepositoryUnreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Every variant is raised before the first file write, so callers can
    /// abort without rollback.
    pub fn is_fatal_before_mutation(&self) -> bool {
        true
    }

    /// Short machine-readable kind, used in run log entries.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "configuration",
            Error::AnalyzerUnavailable { .. } => "analyzer_unavailable",
            Error::RepositoryUnreadable { .. } => "repository_unreadable",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::analyzer("ruff", "binary not found on PATH");
        assert_eq!(
            err.to_string(),
            "Analyzer ruff unavailable: binary not found on PATH"
        );
        assert_eq!(err.kind(), "analyzer_unavailable");

        let err = Error::repository("/nope", "No such file or directory");
        assert!(err.to_string().contains("/nope"));
    }
}
