// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The normalized, tool-version-independent representation of a test run.
//!
//! A [`NormalizedTestRun`] is produced once, by the [`Normalizer`](crate::normalize::Normalizer)
//! or by [`aggregate`](crate::aggregate::aggregate), and is not mutated afterwards. Every
//! query utility in [`crate::query`] returns a new run instead.

use crate::{
    errors::TestStatusParseError,
    helpers::{serde_millis, serde_millis_opt},
};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// A unique identifier for a test run.
///
/// This is the same UUID type used for JUnit report identifiers, so a run's ID carries over
/// unchanged to exported JUnit reports.
pub type RunId = quick_junit::ReportUuid;

/// The resolved status of a single test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum TestStatus {
    /// The test passed on its first attempt.
    Passed,

    /// The test did not pass.
    Failed,

    /// The test was skipped.
    Skipped,

    /// The test failed at least once, then passed on a later attempt.
    Flaky,
}

impl TestStatus {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["passed", "failed", "skipped", "flaky"]
    }

    /// Returns the string representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Flaky => "flaky",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = TestStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            "flaky" => Self::Flaky,
            other => return Err(TestStatusParseError::new(other)),
        };
        Ok(status)
    }
}

/// A position within a source file.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct SourceLocation {
    /// The file path.
    pub file: String,

    /// The 1-based line number, or 0 if unknown.
    pub line: u32,

    /// The 1-based column number, or 0 if unknown.
    pub column: u32,
}

/// The error recorded by a test's last attempt.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestError {
    /// The error message.
    pub message: Option<String>,

    /// The stack trace, if recorded.
    pub stack: Option<String>,

    /// A source snippet around the failure, if recorded.
    pub snippet: Option<String>,

    /// Where the error was raised, if known.
    pub location: Option<SourceLocation>,
}

/// A file or blob attached to a test attempt.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Attachment {
    /// The attachment name, e.g. `screenshot`.
    pub name: String,

    /// The MIME type of the attachment.
    pub content_type: String,

    /// The path to the attachment on disk, if it was written out.
    pub path: Option<String>,

    /// The inline body of the attachment, if embedded.
    pub body: Option<String>,
}

/// An annotation attached to a test, e.g. `skip` or `issue`.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Annotation {
    /// The annotation type.
    #[serde(rename = "type")]
    pub kind: String,

    /// The annotation description.
    pub description: Option<String>,
}

/// One normalized test: a single leaf test entity of the source report, with all of its
/// attempts folded into one record.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NormalizedTest {
    /// A stable identifier, derived from the project, file, title and position of the test.
    pub id: String,

    /// The test's own title.
    pub title: String,

    /// The titles of every ancestor and the test itself, joined with a separator.
    pub full_title: String,

    /// The file the test is defined in, or `unknown`.
    pub file: String,

    /// The line the test is defined at, or 0.
    pub line: u32,

    /// The column the test is defined at, or 0.
    pub column: u32,

    /// The project the test ran under, or `default`.
    pub project: String,

    /// The resolved status.
    pub status: TestStatus,

    /// The duration of the last attempt.
    ///
    /// `None` if the test recorded no attempts; consumers treat that as zero.
    #[serde(default, with = "serde_millis_opt")]
    pub duration: Option<Duration>,

    /// The number of retries performed.
    pub retries: u32,

    /// The error recorded by the last attempt.
    pub error: Option<TestError>,

    /// Attachments recorded by the last attempt.
    pub attachments: Option<Vec<Attachment>>,

    /// Annotations attached to the test.
    pub annotations: Option<Vec<Annotation>>,
}

impl NormalizedTest {
    /// Returns the duration of the last attempt, or zero if there were no attempts.
    #[inline]
    pub fn duration_or_zero(&self) -> Duration {
        self.duration.unwrap_or_default()
    }
}

/// Aggregate counts over a list of tests.
///
/// Invariant: `total == passed + failed + skipped + flaky`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct TestTotals {
    /// The total number of tests.
    pub total: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,

    /// The number of tests that were flaky.
    pub flaky: usize,

    /// The sum of all test durations.
    #[serde(with = "serde_millis")]
    pub duration: Duration,
}

impl TestTotals {
    /// Computes totals over the given tests in a single pass.
    pub fn from_tests<'a>(tests: impl IntoIterator<Item = &'a NormalizedTest>) -> Self {
        let mut totals = Self::default();
        for test in tests {
            totals.record(test);
        }
        totals
    }

    /// Adds a single test to these totals.
    pub fn record(&mut self, test: &NormalizedTest) {
        self.total += 1;
        match test.status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Flaky => self.flaky += 1,
        }
        self.duration += test.duration_or_zero();
    }

    /// Returns true if any test failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Information about one shard (partition) of a larger logical run.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShardInfo {
    /// The shard this is, counting up from 1.
    pub current: u64,

    /// The total number of shards.
    pub total: u64,

    /// The duration of the run this shard was recorded in.
    #[serde(with = "serde_millis")]
    pub duration: Duration,

    /// The number of tests in the report this shard was recorded in.
    ///
    /// A single report does not say which of its tests belong to which shard, so this is the
    /// test count of the whole report rather than a per-shard subset.
    pub test_count: usize,
}

/// A normalized test run.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NormalizedTestRun {
    /// The unique identifier for this run.
    pub run_id: RunId,

    /// The time at which the run started.
    pub started_at: DateTime<FixedOffset>,

    /// The time at which the run ended.
    pub ended_at: DateTime<FixedOffset>,

    /// The wall-clock duration of the run.
    #[serde(with = "serde_millis")]
    pub duration: Duration,

    /// Every project that declared or produced results, sorted and de-duplicated.
    pub projects: Vec<String>,

    /// Shard information, if the run was sharded.
    ///
    /// An explicitly empty list is distinct from `None`.
    pub shards: Option<Vec<ShardInfo>>,

    /// Totals over [`tests`](Self::tests).
    pub totals: TestTotals,

    /// The normalized tests, in report order.
    pub tests: Vec<NormalizedTest>,

    /// Free-form metadata carried over from the report.
    pub metadata: Option<IndexMap<String, serde_json::Value>>,
}

impl NormalizedTestRun {
    /// Returns a new run with `tests` replaced and totals recomputed. All other fields are
    /// carried over unchanged.
    pub fn with_tests(&self, tests: Vec<NormalizedTest>) -> Self {
        Self {
            run_id: self.run_id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration: self.duration,
            projects: self.projects.clone(),
            shards: self.shards.clone(),
            totals: TestTotals::from_tests(&tests),
            tests,
            metadata: self.metadata.clone(),
        }
    }
}
