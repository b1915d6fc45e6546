// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testdigest.

use crate::model::TestStatus;
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single structural problem found while validating a report.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ValidationIssue {
    /// The location of the offending value, e.g. `$.suites[0].specs[2].title`.
    pub path: String,

    /// A short description of what was expected at `path`, e.g. `string`.
    pub expected: String,

    /// A human-readable message describing the issue.
    pub message: String,
}

impl ValidationIssue {
    pub(crate) fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            message: message.into(),
        }
    }
}

/// Describes where the bytes of a report came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReportSource {
    /// The report was read from a file.
    File(Utf8PathBuf),

    /// The report was provided as an in-memory byte buffer.
    Buffer,
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file `{path}`"),
            Self::Buffer => write!(f, "buffer"),
        }
    }
}

/// A report could not be decoded, or did not match the expected report structure.
///
/// Structural problems are all collected before this error is produced, so
/// [`issues`](Self::issues) lists every problem in the report rather than just the first. If the
/// report could not be decoded as JSON in the first place, `issues` is empty and the underlying
/// decode error is available through [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    issues: Vec<ValidationIssue>,
    #[source]
    decode_error: Option<serde_json::Error>,
}

impl ValidationError {
    pub(crate) fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let message = format!(
            "report failed validation: {}",
            issues.iter().map(|issue| &issue.message).join("; ")
        );
        Self {
            message,
            issues,
            decode_error: None,
        }
    }

    pub(crate) fn decode(source: ReportSource, error: serde_json::Error) -> Self {
        Self {
            message: format!("failed to parse JSON report from {source}"),
            issues: Vec::new(),
            decode_error: Some(error),
        }
    }

    /// Returns the human-readable summary of this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structural issues found in the report.
    ///
    /// Empty if the report could not be decoded as JSON.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

/// An error that occurred while parsing a report into a normalized run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The requested report file does not exist.
    #[error("File not found: {path}")]
    NotFound {
        /// The path that was requested.
        path: Utf8PathBuf,
    },

    /// The input was not a path, an object, or a byte buffer.
    #[error("Input must be a file path string, JSON object, or Buffer")]
    InvalidInput,

    /// The report could not be decoded or failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reading the report failed for a reason other than the file not existing.
    #[error(transparent)]
    Io(std::io::Error),
}

impl ParseError {
    pub(crate) fn from_read_error(path: &Utf8Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_owned(),
            }
        } else {
            Self::Io(error)
        }
    }

    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }
}

/// An error that occurred while aggregating the runs of several shards.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum AggregateError {
    /// No runs were passed in.
    #[error("No test runs provided for aggregation")]
    NoRuns,
}

/// An error that occurred while loading configuration.
#[derive(Debug, Error)]
#[error(
    "failed to parse testdigest config{}",
    .config_file.as_ref().map_or(String::new(), |file| format!(" at `{file}`"))
)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<&Utf8Path>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.map(ToOwned::to_owned),
            kind,
        }
    }

    /// Returns the config file that was being loaded, if any.
    ///
    /// `None` means the error came from the embedded default configuration.
    pub fn config_file(&self) -> Option<&Utf8Path> {
        self.config_file.as_deref()
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the layered configuration.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the configuration.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while writing a JUnit report.
#[derive(Debug, Error)]
#[error("error writing JUnit report")]
pub struct JunitExportError {
    #[from]
    inner: quick_junit::SerializeError,
}

/// Error returned while parsing a [`TestStatus`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for test status: {input}\n(known values: {})",
    TestStatus::variants().join(", "),
)]
pub struct TestStatusParseError {
    input: String,
}

impl TestStatusParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
