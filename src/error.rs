//! Error types for rest-request
//!
//! Two kinds of failure exist in a run:
//! - Fatal errors ([`Error`]) that abort before or between items (bad configuration,
//!   unusable output directory, unreadable selection directory)
//! - Per-item failures ([`ErrorRecord`]) that are collected while the run continues and
//!   reported together at the end through [`Error::Failed`]

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for rest-request operations
pub type Result<T> = std::result::Result<T, Error>;

/// Status code used for failures that did not come from an HTTP status line
pub const NON_HTTP_STATUS: i32 = -1;

/// Main error type for rest-request
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "endpoint")
        key: Option<String>,
    },

    /// The output directory could not be created or is not a directory
    #[error("unable to create destination dir [{}]: {reason}", path.display())]
    OutputDir {
        /// The configured output directory
        path: PathBuf,
        /// Why the directory is unusable
        reason: String,
    },

    /// A file-selection rule could not be resolved into paths
    #[error("unable to get paths to fileset [{}]: {reason}", directory.display())]
    Selection {
        /// The selection rule's base directory
        directory: PathBuf,
        /// Why the directory could not be walked
        reason: String,
    },

    /// A remap rule produced an unusable output name
    #[error("unable to remap filename [{input}]: {reason}")]
    Remap {
        /// The name handed to the failing rule
        input: String,
        /// Why the result was rejected
        reason: String,
    },

    /// One or more items failed; every per-item record is carried along
    #[error("{0}")]
    Failed(RunFailure),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Per-item records when this is a [`Error::Failed`], empty otherwise
    pub fn records(&self) -> &[ErrorRecord] {
        match self {
            Error::Failed(failure) => &failure.errors,
            _ => &[],
        }
    }
}

/// Description of one failed item
///
/// `code` is the HTTP status returned by the endpoint, or [`NON_HTTP_STATUS`] when the
/// failure happened outside the HTTP exchange (reading the input, writing the output,
/// connecting to the endpoint).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    /// HTTP status code, or -1
    pub code: i32,
    /// Response body or failure description
    pub message: String,
    /// The input file the failed request was carrying, if any
    pub file: Option<PathBuf>,
}

impl ErrorRecord {
    /// Record for a non-2xx response
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: i32::from(code),
            message: message.into(),
            file: None,
        }
    }

    /// Record for a failure that carries no HTTP status
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: NON_HTTP_STATUS,
            message: message.into(),
            file: None,
        }
    }

    /// Attach the originating input file
    #[must_use]
    pub fn with_file(self, file: &Path) -> Self {
        Self {
            file: Some(file.to_path_buf()),
            ..self
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{} ", file.display())?;
        }
        write!(f, "[{}:{}]", self.code, self.message)
    }
}

/// Aggregated per-item failures of one run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunFailure {
    /// Every record, in the order the items were processed
    pub errors: Vec<ErrorRecord>,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to process files:")?;
        for record in &self.errors {
            write!(f, "\n  {record}")?;
        }
        Ok(())
    }
}
