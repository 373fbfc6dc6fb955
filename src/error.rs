//! Error handling module for motifpipe-setup
//!
//! Provides the error taxonomy for the provisioning pipeline using thiserror.
//! Engine absence is never an error: only stage-level I/O failures end up here
//! and abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the provisioning pipeline
#[derive(Error, Debug)]
pub enum SetupError {
    /// IO errors (copies, directory creation, metadata)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The built configuration could not be read
    #[error("Failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be written
    #[error("Failed to write configuration {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The built configuration is not valid TOML for our schema
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration could not be rendered
    #[error("Configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Staging tree problems (missing tree, failed copy)
    #[error("Staging error: {0}")]
    Staging(String),

    /// Subordinate build command errors
    #[error("Subprocess error: {0}")]
    Subprocess(String),

    /// Pipeline stage sequencing errors
    #[error("Stage error: {0}")]
    Stage(String),

    /// JSON report serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, SetupError>;

impl SetupError {
    /// Create a staging error
    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    /// Create a subprocess error
    pub fn subprocess(msg: impl Into<String>) -> Self {
        Self::Subprocess(msg.into())
    }

    /// Create a stage sequencing error
    pub fn stage(msg: impl Into<String>) -> Self {
        Self::Stage(msg.into())
    }

    /// Wrap a read failure with the offending path
    pub fn config_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigRead {
            path: path.into(),
            source,
        }
    }

    /// Wrap a write failure with the offending path
    pub fn config_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigWrite {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SetupError::staging("staging tree missing");
        assert_eq!(err.to_string(), "Staging error: staging tree missing");

        let err = SetupError::stage("cannot skip");
        assert_eq!(err.to_string(), "Stage error: cannot skip");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SetupError = io_err.into();
        assert!(matches!(err, SetupError::Io(_)));
    }

    #[test]
    fn test_config_read_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SetupError::config_read("/build/cfg/motifpipe.toml", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/build/cfg/motifpipe.toml"));
        assert!(msg.contains("gone"));
    }
}
