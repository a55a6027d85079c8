//! Error types for the harness.
//!
//! A mismatch between expected and actual output is never an error: it is a
//! `Fail` outcome. The types here cover the cases where a test file could not
//! be processed at all.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed test definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A `--NAME--` header names a section outside the known set.
    #[error("line {line}: unknown section '{name}'")]
    UnknownSection { name: String, line: usize },

    /// Content appears before the first section header.
    #[error("line {line}: no section (content before the first header)")]
    NoSection { line: usize },

    /// The same section header appears twice.
    #[error("line {line}: duplicate section '{name}'")]
    DuplicateSection { name: String, line: usize },

    /// A required section is absent.
    #[error("missing required section '{0}'")]
    MissingSection(&'static str),

    /// Neither EXPECT nor EXPECTF is present.
    #[error("missing expectation: one of EXPECT or EXPECTF is required")]
    MissingExpectation,

    /// Both EXPECT and EXPECTF are present.
    #[error("ambiguous expectation: EXPECT and EXPECTF are mutually exclusive")]
    AmbiguousExpectation,

    /// An INI line is not of the form `key=value`.
    #[error("INI line {line}: expected key=value, got {text:?}")]
    InvalidSetting { line: usize, text: String },

    /// The EXPECTF text could not be compiled.
    #[error("invalid EXPECTF pattern: {0}")]
    InvalidPattern(String),
}

/// The script executor could not be invoked.
#[derive(Debug, Error)]
pub enum ExecutionFailure {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture output: {0}")]
    Capture(#[source] std::io::Error),
}

/// A required capability is missing at startup.
#[derive(Debug, Error)]
#[error("interpreter '{program}' is not available: {reason}")]
pub struct SetupError {
    pub program: String,
    pub reason: String,
}

/// Failure to process a single test file.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("malformed test file: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error comes from a malformed test file.
    pub fn is_format(&self) -> bool {
        matches!(self, HarnessError::Format { .. })
    }
}
