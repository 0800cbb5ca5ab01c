//! Error types for the analysis pipeline
//!
//! Per-item problems (a missing header, an unreadable source file) never show
//! up here: they are logged and skipped where they happen. These variants
//! cover the conditions that stop a run or a single repository.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or running an analysis
#[derive(Error, Debug)]
pub enum HunterError {
    #[error("Syscall catalog not found: {0}")]
    CatalogNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No repositories found in {0}")]
    NoRepositories(PathBuf),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(PathBuf),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to build multi-pattern matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),

    #[error("Symbol lookup command failed: {0}")]
    Lookup(String),

    #[error("Worker for {0} panicked")]
    WorkerPanicked(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HunterError {
    /// Wrap an IO error raised while reading `path`
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Wrap an IO error raised while writing `path`
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, HunterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_mentions_path() {
        let err = HunterError::read(
            "/tmp/missing.h",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.h"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_regex_error_converts() {
        let bad = regex::Regex::new("(").unwrap_err();
        let err: HunterError = bad.into();
        assert!(matches!(err, HunterError::Pattern(_)));
    }

    #[test]
    fn test_no_repositories_display() {
        let err = HunterError::NoRepositories(PathBuf::from("repos"));
        assert_eq!(err.to_string(), "No repositories found in repos");
    }
}
