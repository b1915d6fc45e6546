// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders, fixed clocks and proptest strategies shared by unit tests.

use crate::{
    config::NormalizeConfig,
    model::{NormalizedTest, NormalizedTestRun, RunId, ShardInfo, TestStatus, TestTotals},
    normalize::{Clock, Normalizer, RunIdGenerator},
};
use chrono::{DateTime, FixedOffset};
use proptest::prelude::*;
use std::time::Duration;

/// A clock that always returns the same instant.
#[derive(Copy, Clone, Debug)]
pub(crate) struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    pub(crate) fn at(timestamp: &str) -> Self {
        Self(DateTime::parse_from_rfc3339(timestamp).expect("valid RFC 3339 timestamp"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// A run ID generator that always returns the same ID.
#[derive(Copy, Clone, Debug)]
pub(crate) struct FixedRunIds(u128);

impl FixedRunIds {
    pub(crate) fn new(id: u128) -> Self {
        Self(id)
    }
}

impl RunIdGenerator for FixedRunIds {
    fn next_run_id(&self) -> RunId {
        RunId::from_u128(self.0)
    }
}

/// Returns a normalizer with a fixed clock and run ID.
pub(crate) fn fixed_normalizer(config: NormalizeConfig) -> Normalizer {
    Normalizer::new(config)
        .with_clock(FixedClock::at("2024-01-01T00:00:00Z"))
        .with_run_ids(FixedRunIds::new(1))
}

/// Builds [`NormalizedTest`] instances with sensible defaults.
#[derive(Clone, Debug)]
pub(crate) struct TestBuilder {
    test: NormalizedTest,
}

impl TestBuilder {
    pub(crate) fn new(title: &str) -> Self {
        Self {
            test: NormalizedTest {
                id: format!("id-{title}"),
                title: title.to_owned(),
                full_title: title.to_owned(),
                file: "unknown".to_owned(),
                line: 0,
                column: 0,
                project: "default".to_owned(),
                status: TestStatus::Passed,
                duration: None,
                retries: 0,
                error: None,
                attachments: None,
                annotations: None,
            },
        }
    }

    pub(crate) fn status(mut self, status: TestStatus) -> Self {
        self.test.status = status;
        self
    }

    pub(crate) fn millis(mut self, millis: u64) -> Self {
        self.test.duration = Some(Duration::from_millis(millis));
        self
    }

    pub(crate) fn retries(mut self, retries: u32) -> Self {
        self.test.retries = retries;
        self
    }

    pub(crate) fn project(mut self, project: &str) -> Self {
        self.test.project = project.to_owned();
        self
    }

    pub(crate) fn file(mut self, file: &str) -> Self {
        self.test.file = file.to_owned();
        self
    }

    pub(crate) fn full_title(mut self, full_title: &str) -> Self {
        self.test.full_title = full_title.to_owned();
        self
    }

    pub(crate) fn build(self) -> NormalizedTest {
        self.test
    }
}

/// Builds a run around `tests`, with a fixed ID and start time.
pub(crate) fn make_run(id: u128, tests: Vec<NormalizedTest>) -> NormalizedTestRun {
    let totals = TestTotals::from_tests(&tests);
    let started_at =
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").expect("valid RFC 3339 timestamp");
    let mut projects: Vec<_> = tests.iter().map(|test| test.project.clone()).collect();
    projects.sort();
    projects.dedup();
    NormalizedTestRun {
        run_id: RunId::from_u128(id),
        started_at,
        ended_at: started_at + chrono::Duration::seconds(10),
        duration: Duration::from_secs(10),
        projects,
        shards: None,
        totals,
        tests,
        metadata: None,
    }
}

/// Builds the run of shard `current` of `total`.
pub(crate) fn make_shard_run(
    current: u64,
    total: u64,
    tests: Vec<NormalizedTest>,
) -> NormalizedTestRun {
    let mut run = make_run(u128::from(current), tests);
    run.shards = Some(vec![ShardInfo {
        current,
        total,
        duration: run.duration,
        test_count: run.tests.len(),
    }]);
    run
}

/// Strategy for generating tests with a small pool of projects, files and titles, so that
/// filters and groupings have something to match.
pub(crate) fn arb_test() -> impl Strategy<Value = NormalizedTest> {
    (
        "[a-c]{1,3}",
        prop::sample::select(vec!["chromium", "firefox", "webkit"]),
        prop::sample::select(vec!["a.spec.ts", "b.spec.ts", "c.spec.ts"]),
        any::<TestStatus>(),
        prop::option::of(0u64..10_000),
        0u32..3,
    )
        .prop_map(|(title, project, file, status, millis, retries)| {
            let mut builder = TestBuilder::new(&title)
                .project(project)
                .file(file)
                .status(status)
                .retries(retries)
                .full_title(&format!("{file} › {title}"));
            if let Some(millis) = millis {
                builder = builder.millis(millis);
            }
            builder.build()
        })
}

/// Strategy for generating runs of up to `max_len` tests.
pub(crate) fn arb_run(max_len: usize) -> impl Strategy<Value = NormalizedTestRun> {
    prop::collection::vec(arb_test(), 0..=max_len).prop_map(|tests| make_run(0, tests))
}
