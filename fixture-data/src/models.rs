// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data models for fixture information.

use iddqd::{IdOrdItem, id_upcast};

/// A fixture report, along with what normalizing it should produce.
#[derive(Clone, Debug)]
pub struct ReportFixture {
    /// The file name of the report, relative to [`REPORTS_DIR`](crate::reports::REPORTS_DIR).
    pub file_name: &'static str,

    /// The contents of the report.
    pub json: &'static str,

    /// The shard this report was recorded in, as `(current, total)`.
    pub shard: Option<(u64, u64)>,

    /// The projects the normalized run should list.
    pub projects: &'static [&'static str],

    /// The expected tests, in order.
    pub tests: Vec<TestCaseFixture>,
}

impl ReportFixture {
    pub fn new(file_name: &'static str, json: &'static str) -> Self {
        Self {
            file_name,
            json,
            shard: None,
            projects: &[],
            tests: Vec::new(),
        }
    }

    pub fn with_shard(mut self, current: u64, total: u64) -> Self {
        self.shard = Some((current, total));
        self
    }

    pub fn with_projects(mut self, projects: &'static [&'static str]) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_tests(mut self, tests: impl IntoIterator<Item = TestCaseFixture>) -> Self {
        self.tests = tests.into_iter().collect();
        self
    }

    /// Returns the number of tests with the given status.
    pub fn count(&self, status: TestCaseFixtureStatus) -> usize {
        self.tests
            .iter()
            .filter(|test| test.status == status)
            .count()
    }

    /// Returns the sum of the expected test durations, in milliseconds.
    pub fn total_millis(&self) -> f64 {
        self.tests.iter().filter_map(|test| test.millis).sum()
    }
}

impl IdOrdItem for ReportFixture {
    type Key<'a> = &'a str;
    fn key(&self) -> Self::Key<'_> {
        self.file_name
    }
    id_upcast!();
}

/// One expected normalized test.
#[derive(Clone, Debug, PartialEq)]
pub struct TestCaseFixture {
    pub full_title: &'static str,
    pub project: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
    pub status: TestCaseFixtureStatus,
    pub retries: u32,
    /// The duration of the last attempt, or `None` if the test has no attempts.
    pub millis: Option<f64>,
}

impl TestCaseFixture {
    pub fn new(
        full_title: &'static str,
        project: &'static str,
        status: TestCaseFixtureStatus,
    ) -> Self {
        Self {
            full_title,
            project,
            file: "unknown",
            line: 0,
            column: 0,
            status,
            retries: 0,
            millis: None,
        }
    }

    pub fn at(mut self, file: &'static str, line: u32, column: u32) -> Self {
        self.file = file;
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_millis(mut self, millis: f64) -> Self {
        self.millis = Some(millis);
        self
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestCaseFixtureStatus {
    Passed,
    Failed,
    Skipped,
    Flaky,
}

impl TestCaseFixtureStatus {
    /// Returns the status as rendered in normalized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Flaky => "flaky",
        }
    }
}
