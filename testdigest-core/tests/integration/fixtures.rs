// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use chrono::{DateTime, FixedOffset};
use fixture_data::{models::ReportFixture, reports::REPORTS_DIR};
use std::time::Duration;
use testdigest_core::{
    config::NormalizeConfig,
    model::{NormalizedTestRun, RunId},
    normalize::{Clock, Normalizer, RunIdGenerator},
    parse::ReportParser,
};

pub const FIXED_NOW: &str = "2024-07-01T12:00:00+00:00";

#[derive(Debug)]
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(FIXED_NOW).expect("valid timestamp")
    }
}

#[derive(Debug)]
pub struct SequentialRunIds(pub u128);

impl RunIdGenerator for SequentialRunIds {
    fn next_run_id(&self) -> RunId {
        RunId::from_u128(self.0)
    }
}

/// Converts fixture milliseconds to a duration, rounding to the nearest nanosecond.
pub fn millis_to_duration(millis: f64) -> Duration {
    Duration::from_nanos((millis * 1_000_000.0).round() as u64)
}

pub fn fixture_path(file_name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(REPORTS_DIR).join(file_name)
}

pub fn parser(config: NormalizeConfig, run_id: u128) -> ReportParser {
    ReportParser::new(
        Normalizer::new(config)
            .with_clock(FixedClock)
            .with_run_ids(SequentialRunIds(run_id)),
    )
}

#[track_caller]
pub fn check_run(fixture: &ReportFixture, run: &NormalizedTestRun) {
    assert_eq!(
        run.projects, fixture.projects,
        "{}: projects match",
        fixture.file_name
    );
    assert_eq!(
        run.tests.len(),
        fixture.tests.len(),
        "{}: test counts match",
        fixture.file_name
    );

    for (actual, expected) in run.tests.iter().zip(&fixture.tests) {
        let context = format!("{}: {}", fixture.file_name, expected.full_title);
        assert_eq!(actual.full_title, expected.full_title, "{context}");
        assert_eq!(actual.project, expected.project, "{context}");
        assert_eq!(
            (actual.file.as_str(), actual.line, actual.column),
            (expected.file, expected.line, expected.column),
            "{context}: location"
        );
        assert_eq!(actual.status.as_str(), expected.status.as_str(), "{context}");
        assert_eq!(actual.retries, expected.retries, "{context}: retries");
        assert_eq!(
            actual.duration,
            expected.millis.map(millis_to_duration),
            "{context}: duration"
        );
    }

    let totals = &run.totals;
    assert_eq!(totals.total, fixture.tests.len());
    assert_eq!(
        totals.total,
        totals.passed + totals.failed + totals.skipped + totals.flaky,
        "{}: totals are consistent",
        fixture.file_name
    );

    match fixture.shard {
        Some((current, total)) => {
            let shards = run.shards.as_deref().expect("shard info present");
            assert_eq!(shards.len(), 1);
            assert_eq!((shards[0].current, shards[0].total), (current, total));
        }
        None => assert_eq!(run.shards, None),
    }
}
