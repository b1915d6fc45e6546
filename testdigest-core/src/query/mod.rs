// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering, sorting, grouping and summarizing normalized runs.
//!
//! None of these functions mutate their input: [`filter_tests`] and [`sort_tests`] return a new
//! run, with totals recomputed and every other field carried over.

mod comparator;
mod predicate;

pub use comparator::*;
pub use predicate::*;

use crate::{
    helpers::{serde_millis, serde_millis_opt},
    model::{NormalizedTest, NormalizedTestRun, RunId, TestStatus, TestTotals},
};
use indexmap::IndexMap;
use serde::Serialize;
use std::{hash::Hash, time::Duration};

/// Returns a run with only the tests accepted by `predicate`.
pub fn filter_tests(run: &NormalizedTestRun, predicate: &TestPredicate) -> NormalizedTestRun {
    let tests = run
        .tests
        .iter()
        .filter(|test| predicate.matches(test))
        .cloned()
        .collect();
    run.with_tests(tests)
}

/// Returns a run with tests stably sorted by `order`.
pub fn sort_tests(run: &NormalizedTestRun, order: &TestOrder) -> NormalizedTestRun {
    let mut tests = run.tests.clone();
    tests.sort_by(|a, b| order.compare(a, b));
    run.with_tests(tests)
}

/// Groups tests by `key`, in order of first appearance.
pub fn group_tests<K, F>(run: &NormalizedTestRun, mut key: F) -> IndexMap<K, Vec<&NormalizedTest>>
where
    K: Hash + Eq,
    F: FnMut(&NormalizedTest) -> K,
{
    let mut groups: IndexMap<K, Vec<&NormalizedTest>> = IndexMap::new();
    for test in &run.tests {
        groups.entry(key(test)).or_default().push(test);
    }
    groups
}

/// A condensed view of a run, suitable for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunSummary {
    /// The run ID.
    pub run_id: RunId,

    /// Totals over the run.
    pub totals: TestTotals,

    /// The fraction of tests that ran and ended up passing.
    ///
    /// Passed and flaky tests count as passing; skipped tests are left out. This is 1.0 if no
    /// test ran.
    pub pass_rate: f64,

    /// The wall-clock duration of the run.
    #[serde(with = "serde_millis")]
    pub duration: Duration,

    /// The slowest tests, slowest first.
    pub slowest: Vec<SummaryEntry>,

    /// The tests that failed, in run order.
    pub failed: Vec<SummaryEntry>,

    /// The tests that were flaky, in run order.
    pub flaky: Vec<SummaryEntry>,
}

/// One test in a [`RunSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SummaryEntry {
    /// The full title.
    pub full_title: String,

    /// The file.
    pub file: String,

    /// The project.
    pub project: String,

    /// The resolved status.
    pub status: TestStatus,

    /// The duration, if recorded.
    #[serde(with = "serde_millis_opt")]
    pub duration: Option<Duration>,
}

impl From<&NormalizedTest> for SummaryEntry {
    fn from(test: &NormalizedTest) -> Self {
        Self {
            full_title: test.full_title.clone(),
            file: test.file.clone(),
            project: test.project.clone(),
            status: test.status,
            duration: test.duration,
        }
    }
}

/// Summarizes a run, listing up to `slowest_count` of the slowest tests.
pub fn summarize(run: &NormalizedTestRun, slowest_count: usize) -> RunSummary {
    let totals = TestTotals::from_tests(&run.tests);
    let ran = totals.total - totals.skipped;
    let pass_rate = if ran == 0 {
        1.0
    } else {
        (totals.passed + totals.flaky) as f64 / ran as f64
    };

    let mut by_duration: Vec<&NormalizedTest> = run.tests.iter().collect();
    // Stable, so equally slow tests stay in run order.
    by_duration.sort_by(|a, b| TestOrder::Duration.reverse().compare(a, b));

    let entries = |status: TestStatus| -> Vec<SummaryEntry> {
        run.tests
            .iter()
            .filter(|test| test.status == status)
            .map(SummaryEntry::from)
            .collect()
    };

    RunSummary {
        run_id: run.run_id,
        pass_rate,
        duration: run.duration,
        slowest: by_duration
            .into_iter()
            .take(slowest_count)
            .map(SummaryEntry::from)
            .collect(),
        failed: entries(TestStatus::Failed),
        flaky: entries(TestStatus::Flaky),
        totals,
    }
}
