// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    exit_codes::DigestExitCode,
    output::{NO_HEADING_TARGET, StderrStyles},
};
use camino::Utf8PathBuf;
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::error::Error;
use testdigest_core::errors::{
    AggregateError, ConfigParseError, ConfigParseErrorKind, JunitExportError, ParseError,
};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure: bad input, bad configuration or failing tests.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to parse report")]
    ReportParseError {
        path: Utf8PathBuf,
        #[source]
        err: ParseError,
    },
    #[error("aggregate error")]
    AggregateError {
        #[from]
        err: AggregateError,
    },
    #[error("invalid --grep pattern")]
    InvalidGrepPattern {
        pattern: String,
        #[source]
        err: regex::Error,
    },
    #[error("reports are not shards of one execution")]
    InconsistentShards { paths: Vec<Utf8PathBuf> },
    #[error("tests failed")]
    TestsFailed { failed: usize },
    #[error("failed to write output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("failed to create JUnit report file")]
    JunitCreateError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to write JUnit report")]
    JunitWriteError {
        path: Utf8PathBuf,
        #[source]
        err: JunitExportError,
    },
}

impl ExpectedError {
    pub(crate) fn report_parse_error(path: impl Into<Utf8PathBuf>, err: ParseError) -> Self {
        Self::ReportParseError {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn invalid_grep_pattern(pattern: impl Into<String>, err: regex::Error) -> Self {
        Self::InvalidGrepPattern {
            pattern: pattern.into(),
            err,
        }
    }

    pub(crate) fn write_output_error(err: impl Into<std::io::Error>) -> Self {
        Self::WriteOutputError { err: err.into() }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } => DigestExitCode::CONFIG_ERROR,
            Self::ReportParseError { .. }
            | Self::AggregateError { .. }
            | Self::InvalidGrepPattern { .. } => DigestExitCode::INVALID_INPUT,
            Self::InconsistentShards { .. } => DigestExitCode::INCONSISTENT_SHARDS,
            Self::TestsFailed { .. } => DigestExitCode::TESTS_FAILED,
            Self::WriteOutputError { .. }
            | Self::JunitCreateError { .. }
            | Self::JunitWriteError { .. } => DigestExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                match err.config_file() {
                    Some(config_file) => error!(
                        "failed to parse config file `{}`",
                        config_file.style(styles.bold)
                    ),
                    None => error!("failed to parse default config"),
                }
                match err.kind() {
                    ConfigParseErrorKind::BuildError(error) => Some(error.as_ref() as &dyn Error),
                    ConfigParseErrorKind::DeserializeError(error) => {
                        Some(error.as_ref() as &dyn Error)
                    }
                    other => Some(other as &dyn Error),
                }
            }
            Self::ReportParseError { path, err } => match err {
                ParseError::NotFound { .. } => {
                    error!("report `{}` not found", path.style(styles.bold));
                    None
                }
                ParseError::Validation(validation) if !validation.issues().is_empty() => {
                    error!(
                        "report `{}` failed validation with {} {}:",
                        path.style(styles.bold),
                        validation.issues().len(),
                        if validation.issues().len() == 1 {
                            "issue"
                        } else {
                            "issues"
                        },
                    );
                    for issue in validation.issues() {
                        error!(target: NO_HEADING_TARGET, "  - {}", issue.message);
                    }
                    None
                }
                other => {
                    error!("failed to parse report `{}`", path.style(styles.bold));
                    Some(other as &dyn Error)
                }
            },
            Self::AggregateError { err } => {
                error!("{err}");
                None
            }
            Self::InvalidGrepPattern { pattern, err } => {
                error!(
                    "invalid regular expression for --grep: `{}`",
                    pattern.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::InconsistentShards { paths } => {
                error!(
                    "reports are not the shards of a single execution: {}",
                    paths.iter().map(|path| path.style(styles.bold)).join(", ")
                );
                error!(
                    target: NO_HEADING_TARGET,
                    "{}",
                    "(hint: every report must carry shard information, agree on the shard \
                     total, and claim a distinct shard)"
                        .style(styles.warning_text)
                );
                None
            }
            Self::TestsFailed { failed } => {
                error!(
                    "{} {} failed",
                    failed.style(styles.bold),
                    if *failed == 1 { "test" } else { "tests" },
                );
                None
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
            Self::JunitCreateError { path, err } => {
                error!(
                    "failed to create JUnit report at `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::JunitWriteError { path, err } => {
                error!("failed to write JUnit report to `{}`", path.style(styles.bold));
                err.source()
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
