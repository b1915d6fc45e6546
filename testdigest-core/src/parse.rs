// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The top-level entry point: from a path, buffer or JSON value to a normalized run.

use crate::{
    config::NormalizeConfig,
    errors::{ParseError, ReportSource, ValidationError},
    model::NormalizedTestRun,
    normalize::Normalizer,
    schema::{RawReport, validate},
};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::{fmt, io};
use tracing::debug;

/// The input to [`parse_report`].
#[derive(Clone, Debug)]
pub enum ReportInput<'a> {
    /// A path to a JSON report on disk.
    Path(&'a Utf8Path),

    /// The raw bytes of a JSON report.
    Bytes(&'a [u8]),

    /// An already-decoded JSON value.
    ///
    /// Objects are used as-is, and strings are treated as paths. Anything else is rejected.
    Value(Value),
}

impl<'a> From<&'a Utf8Path> for ReportInput<'a> {
    fn from(path: &'a Utf8Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a [u8]> for ReportInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Value> for ReportInput<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Reads the bytes of report files.
///
/// This is the only I/O performed while parsing. It is called at most once per parse.
pub trait ReportReader: fmt::Debug + Send + Sync {
    /// Reads the file at `path` in full.
    fn read_bytes(&self, path: &Utf8Path) -> io::Result<Vec<u8>>;
}

/// A [`ReportReader`] that reads from the file system.
#[derive(Copy, Clone, Debug, Default)]
pub struct FsReportReader;

impl ReportReader for FsReportReader {
    fn read_bytes(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        fs_err::read(path)
    }
}

/// Options for [`parse_report`].
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    /// Settings for normalization.
    pub normalize: NormalizeConfig,
}

/// Parses and normalizes a report using the file system and the system clock.
pub fn parse_report<'a>(
    input: impl Into<ReportInput<'a>>,
    options: &ParseOptions,
) -> Result<NormalizedTestRun, ParseError> {
    ReportParser::new(Normalizer::new(options.normalize.clone())).parse(input)
}

/// Acquires, decodes, validates and normalizes reports.
#[derive(Debug)]
pub struct ReportParser {
    normalizer: Normalizer,
    reader: Box<dyn ReportReader>,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

impl ReportParser {
    /// Creates a new parser that reads files from the file system.
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            reader: Box::new(FsReportReader),
        }
    }

    /// Replaces the reader used for [`ReportInput::Path`] inputs.
    pub fn with_reader(mut self, reader: impl ReportReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// Parses and normalizes a report.
    pub fn parse<'a>(
        &self,
        input: impl Into<ReportInput<'a>>,
    ) -> Result<NormalizedTestRun, ParseError> {
        let report = self.read_report(input)?;
        Ok(self.normalizer.normalize(&report))
    }

    /// Acquires, decodes and validates a report without normalizing it.
    pub fn read_report<'a>(
        &self,
        input: impl Into<ReportInput<'a>>,
    ) -> Result<RawReport, ParseError> {
        let value = match input.into() {
            ReportInput::Path(path) => self.read_path(path)?,
            ReportInput::Bytes(bytes) => decode(bytes, ReportSource::Buffer)?,
            ReportInput::Value(Value::String(path)) => {
                self.read_path(&Utf8PathBuf::from(path))?
            }
            ReportInput::Value(value @ Value::Object(_)) => value,
            ReportInput::Value(_) => return Err(ParseError::InvalidInput),
        };
        Ok(validate(&value)?)
    }

    fn read_path(&self, path: &Utf8Path) -> Result<Value, ParseError> {
        debug!("reading report from `{path}`");
        let bytes = self
            .reader
            .read_bytes(path)
            .map_err(|error| ParseError::from_read_error(path, error))?;
        decode(&bytes, ReportSource::File(path.to_owned()))
    }
}

fn decode(bytes: &[u8], source: ReportSource) -> Result<Value, ParseError> {
    serde_json::from_slice(bytes).map_err(|error| ValidationError::decode(source, error).into())
}
