// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statistics over normalized runs.

use crate::{
    helpers::serde_millis,
    model::{NormalizedTest, NormalizedTestRun, TestStatus, TestTotals},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistics computed over a [`NormalizedTestRun`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestStatistics {
    /// Totals over every test in the run.
    pub totals: TestTotals,

    /// Duration statistics.
    pub durations: DurationStats,

    /// Totals per project, in order of first appearance.
    pub by_project: IndexMap<String, TestTotals>,

    /// Totals per file, in order of first appearance.
    pub by_file: IndexMap<String, TestTotals>,
}

/// Summary statistics over per-test durations.
///
/// Tests without a recorded duration count as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DurationStats {
    /// The sum of all durations.
    #[serde(with = "serde_millis")]
    pub total: Duration,

    /// The mean duration.
    #[serde(with = "serde_millis")]
    pub average: Duration,

    /// The 50th percentile.
    #[serde(with = "serde_millis")]
    pub median: Duration,

    /// The 95th percentile.
    #[serde(with = "serde_millis")]
    pub p95: Duration,

    /// The shortest duration.
    #[serde(with = "serde_millis")]
    pub min: Duration,

    /// The longest duration.
    #[serde(with = "serde_millis")]
    pub max: Duration,
}

impl DurationStats {
    /// Computes duration statistics over the given values.
    pub fn from_durations(mut durations: Vec<Duration>) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        durations.sort_unstable();

        let total: Duration = durations.iter().sum();
        // The length is at least 1 here, and test counts comfortably fit in a u32.
        let count = u32::try_from(durations.len()).unwrap_or(u32::MAX);
        Self {
            total,
            average: total / count,
            median: percentile(&durations, 50.0),
            p95: percentile(&durations, 95.0),
            min: durations[0],
            max: durations[durations.len() - 1],
        }
    }
}

/// Returns the `p`th percentile of `sorted`, using the nearest-rank method.
///
/// `sorted` must be in ascending order. Returns zero for an empty slice.
pub fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (p * sorted.len() as f64 / 100.0).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

/// Computes statistics over a run.
pub fn compute_statistics(run: &NormalizedTestRun) -> TestStatistics {
    let mut totals = TestTotals::default();
    let mut by_project: IndexMap<String, TestTotals> = IndexMap::new();
    let mut by_file: IndexMap<String, TestTotals> = IndexMap::new();
    let mut durations = Vec::with_capacity(run.tests.len());

    for test in &run.tests {
        totals.record(test);
        by_project
            .entry(test.project.clone())
            .or_default()
            .record(test);
        by_file.entry(test.file.clone()).or_default().record(test);
        durations.push(test.duration_or_zero());
    }

    TestStatistics {
        totals,
        durations: DurationStats::from_durations(durations),
        by_project,
        by_file,
    }
}

/// Returns the tests that failed.
pub fn failed_tests(run: &NormalizedTestRun) -> Vec<&NormalizedTest> {
    run.tests
        .iter()
        .filter(|test| test.status == TestStatus::Failed)
        .collect()
}

/// Returns the tests that were flaky, or that needed retries.
pub fn flaky_tests(run: &NormalizedTestRun) -> Vec<&NormalizedTest> {
    run.tests
        .iter()
        .filter(|test| test.status == TestStatus::Flaky || test.retries > 0)
        .collect()
}

/// Returns the tests that ran under `project`.
pub fn tests_by_project<'a>(run: &'a NormalizedTestRun, project: &str) -> Vec<&'a NormalizedTest> {
    run.tests
        .iter()
        .filter(|test| test.project == project)
        .collect()
}

/// Returns the tests defined in `file`.
pub fn tests_by_file<'a>(run: &'a NormalizedTestRun, file: &str) -> Vec<&'a NormalizedTest> {
    run.tests.iter().filter(|test| test.file == file).collect()
}
