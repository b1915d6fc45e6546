// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde_json::{Map, Value};

/// A validated report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawReport {
    /// The report configuration.
    pub config: ReportConfig,

    /// The top-level suites.
    pub suites: Vec<Suite>,

    /// Run-level statistics, if recorded.
    pub stats: Option<ReportStats>,
}

/// The `config` section of a report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportConfig {
    /// Projects declared in the configuration.
    pub projects: Vec<ProjectDecl>,

    /// Shard descriptors.
    ///
    /// Older reports carry a single descriptor, newer ones a list. `None` if the report was not
    /// sharded.
    pub shards: Option<Vec<ShardDescriptor>>,

    /// Free-form metadata.
    pub metadata: Option<Map<String, Value>>,

    /// The version of the tool that produced the report.
    pub version: Option<String>,
}

impl ReportConfig {
    /// Returns the names of the declared projects, skipping projects with neither a name nor
    /// an ID.
    pub fn declared_project_names(&self) -> impl Iterator<Item = &str> {
        self.projects.iter().filter_map(ProjectDecl::display_name)
    }
}

/// A project declared in the report configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProjectDecl {
    /// The project name.
    pub name: Option<String>,

    /// The project ID.
    pub id: Option<String>,
}

impl ProjectDecl {
    /// Returns the name of the project, falling back to its ID. Empty names are ignored.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.name.as_deref()).or_else(|| non_empty(self.id.as_deref()))
    }
}

/// A `current`/`total` shard descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShardDescriptor {
    /// The shard this is, counting up from 1.
    pub current: u64,

    /// The total number of shards.
    pub total: u64,
}

/// The `stats` section of a report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportStats {
    /// The start time of the run, as recorded (usually RFC 3339).
    pub start_time: Option<String>,

    /// The duration of the run in milliseconds.
    pub duration_ms: Option<f64>,
}

/// An optional file/line/column triple. Each part may be absent independently.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawLocation {
    /// The file path.
    pub file: Option<String>,

    /// The line number.
    pub line: Option<u32>,

    /// The column number.
    pub column: Option<u32>,
}

impl RawLocation {
    /// Returns a location with each absent part of `self` filled in from `fallback`.
    pub fn or(&self, fallback: &RawLocation) -> RawLocation {
        RawLocation {
            file: self.file.clone().or_else(|| fallback.file.clone()),
            line: self.line.or(fallback.line),
            column: self.column.or(fallback.column),
        }
    }
}

/// A named grouping node. Suites nest further suites and contain leaf tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suite {
    /// The suite title.
    pub title: String,

    /// Where the suite is defined.
    pub location: RawLocation,

    /// Child suites, in document order.
    pub suites: Vec<Suite>,

    /// Leaf tests, in processing order: all specs, followed by all legacy test cases.
    pub leaves: Vec<LeafNode>,
}

/// The representation of one logical test under a suite.
///
/// Reports have used two different conventions over time, and both may appear in the same
/// tree.
#[derive(Clone, Debug, PartialEq)]
pub enum LeafNode {
    /// A spec holding one attempt-holder per project the test ran under.
    Spec(Spec),

    /// A legacy test case, which is itself the attempt-holder.
    TestCase(TestCase),
}

/// A spec node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spec {
    /// The spec title.
    pub title: String,

    /// The spec ID assigned by the tool.
    pub id: Option<String>,

    /// Where the spec is defined.
    pub location: RawLocation,

    /// Tags attached to the spec.
    pub tags: Vec<String>,

    /// The attempt-holders under this spec.
    pub tests: Vec<AttemptHolder>,
}

/// A legacy test-case node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestCase {
    /// The test-case title.
    pub title: String,

    /// Where the test case is defined.
    pub location: RawLocation,

    /// The configuration and attempts of this test case.
    pub holder: AttemptHolder,
}

/// The coarse, tool-assigned outcome of a test across all of its attempts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The test behaved as expected.
    Expected,

    /// The test did not behave as expected.
    Unexpected,

    /// The test was flaky according to the tool.
    Flaky,

    /// The test was skipped.
    Skipped,

    /// An outcome not known to this version.
    Other(String),
}

impl Outcome {
    pub(crate) fn from_token(token: &str) -> Self {
        match token {
            "expected" => Self::Expected,
            "unexpected" => Self::Unexpected,
            "flaky" => Self::Flaky,
            "skipped" => Self::Skipped,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns true if this outcome means the test ended up passing.
    pub fn is_passing(&self) -> bool {
        matches!(self, Self::Expected | Self::Flaky)
    }
}

/// The status of a single attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttemptStatus {
    /// The attempt passed.
    Passed,

    /// The attempt failed.
    Failed,

    /// The attempt timed out.
    TimedOut,

    /// The attempt was skipped.
    Skipped,

    /// The attempt was interrupted.
    Interrupted,

    /// A status not known to this version.
    Other(String),
}

impl AttemptStatus {
    pub(crate) fn from_token(token: &str) -> Self {
        match token {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "timedOut" => Self::TimedOut,
            "skipped" => Self::Skipped,
            "interrupted" => Self::Interrupted,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns true if this attempt failed, timed out or was interrupted.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut | Self::Interrupted)
    }
}

/// The node recording one test's configuration plus all of its execution attempts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttemptHolder {
    /// The holder's own title. Usually absent under specs.
    pub title: Option<String>,

    /// The name of the project this test ran under.
    pub project_name: Option<String>,

    /// The ID of the project this test ran under.
    pub project_id: Option<String>,

    /// The coarse outcome.
    pub status: Option<Outcome>,

    /// The expected status of the test, e.g. `passed` or `skipped`.
    pub expected_status: Option<String>,

    /// An explicitly reported retry count.
    pub retries: Option<u32>,

    /// An explicit per-test location.
    pub location: RawLocation,

    /// Annotations attached to the test.
    pub annotations: Vec<RawAnnotation>,

    /// The attempts, oldest first.
    pub results: Vec<Attempt>,
}

impl AttemptHolder {
    /// Returns the project this holder names explicitly, preferring the name over the ID.
    pub fn explicit_project(&self) -> Option<&str> {
        non_empty(self.project_name.as_deref()).or_else(|| non_empty(self.project_id.as_deref()))
    }

    /// Returns the most recent attempt.
    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.results.last()
    }
}

/// A raw annotation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawAnnotation {
    /// The annotation type.
    pub kind: String,

    /// The annotation description.
    pub description: Option<String>,
}

/// One execution attempt of a test.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attempt {
    /// The attempt status.
    pub status: Option<AttemptStatus>,

    /// The duration in milliseconds.
    pub duration_ms: Option<f64>,

    /// The retry index of this attempt (0 for the first).
    pub retry: Option<u32>,

    /// The start time of the attempt.
    pub start_time: Option<String>,

    /// The worker that ran the attempt.
    pub worker_index: Option<i64>,

    /// The primary error.
    pub error: Option<RawError>,

    /// All errors reported by the attempt.
    pub errors: Vec<RawError>,

    /// Attachments produced by the attempt.
    pub attachments: Vec<RawAttachment>,
}

impl Attempt {
    /// Returns the representative error of this attempt: the primary error, or else the first
    /// of the reported errors.
    pub fn representative_error(&self) -> Option<&RawError> {
        self.error.as_ref().or_else(|| self.errors.first())
    }
}

/// A raw error.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawError {
    /// The error message.
    pub message: Option<String>,

    /// The stack trace.
    pub stack: Option<String>,

    /// A source snippet.
    pub snippet: Option<String>,

    /// Where the error was raised.
    pub location: Option<RawLocation>,
}

/// A raw attachment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawAttachment {
    /// The attachment name.
    pub name: String,

    /// The MIME type.
    pub content_type: String,

    /// The path on disk.
    pub path: Option<String>,

    /// The inline body.
    pub body: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
