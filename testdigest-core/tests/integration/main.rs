// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for testdigest-core, driven by the reports in the `fixture-data` crate.

use color_eyre::Result;
use fixture_data::{
    models::TestCaseFixtureStatus,
    reports::{EXPECTED_REPORTS, LEGACY, MERGED_SHARDS_MILLIS, MODERN, SHARD_1_OF_2, SHARD_2_OF_2},
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use testdigest_core::{
    aggregate::{aggregate, are_runs_from_same_execution, missing_shards},
    config::{DigestConfig, NormalizeConfig, StatusPolicy},
    junit::write_junit,
    model::{NormalizedTestRun, RunId, TestStatus},
    query::{TestOrder, TestPredicate, filter_tests, sort_tests, summarize},
    stats::compute_statistics,
};

mod fixtures;

use fixtures::*;

#[test]
fn fixtures_normalize_as_expected() -> Result<()> {
    let parser = parser(NormalizeConfig::default(), 1);
    for fixture in &*EXPECTED_REPORTS {
        let from_path = parser.parse(fixture_path(fixture.file_name).as_path())?;
        check_run(fixture, &from_path);

        let from_bytes = parser.parse(fixture.json.as_bytes())?;
        assert_eq!(from_bytes, from_path, "{}: sources agree", fixture.file_name);
    }
    Ok(())
}

#[test]
fn modern_report_run_fields() -> Result<()> {
    let run = parser(NormalizeConfig::default(), 7).parse(fixture_path(MODERN).as_path())?;

    assert_eq!(run.run_id, RunId::from_u128(7));
    assert_eq!(run.started_at.to_rfc3339(), "2024-06-01T09:00:00+00:00");
    assert_eq!(run.duration, Duration::from_micros(41_250_500));
    assert_eq!(run.ended_at - run.started_at, chrono::Duration::microseconds(41_250_500));

    let metadata = run.metadata.as_ref().expect("metadata present");
    assert_eq!(metadata["commit"], "4f2a9c1");
    assert_eq!(metadata["branch"], "main");

    let coupon = &run.tests[2];
    let error = coupon.error.as_ref().expect("failed test has an error");
    assert_eq!(
        error.message.as_deref(),
        Some("Error: expected 90, received 100")
    );
    assert!(error.snippet.is_some(), "last attempt's error is used");
    assert_eq!(coupon.attachments.as_ref().map(Vec::len), Some(1));

    let skipped = &run.tests[4];
    let annotations = skipped.annotations.as_ref().expect("annotations present");
    assert_eq!(annotations[0].kind, "skip");

    let ids: std::collections::HashSet<_> = run.tests.iter().map(|test| &test.id).collect();
    assert_eq!(ids.len(), run.tests.len(), "IDs are unique");
    Ok(())
}

#[test]
fn legacy_report_uses_clock_and_test_durations() -> Result<()> {
    let run = parser(NormalizeConfig::default(), 1).parse(fixture_path(LEGACY).as_path())?;
    assert_eq!(run.started_at.to_rfc3339(), FIXED_NOW);
    assert_eq!(run.duration, Duration::from_micros(665_250));
    assert_eq!(run.metadata, None);
    assert_eq!(
        run.tests[1]
            .error
            .as_ref()
            .and_then(|error| error.message.as_deref()),
        Some("locator('#results') not found")
    );
    Ok(())
}

#[test]
fn status_token_policy_from_config_file() -> Result<()> {
    let dir = camino_tempfile::Utf8TempDir::new()?;
    let config_path = dir.path().join("testdigest.toml");
    std::fs::write(
        &config_path,
        "[normalize]\nstatus-policy = \"status-token\"\n",
    )?;
    let config = DigestConfig::from_sources(Some(&config_path))?;
    assert_eq!(config.normalize.status_policy, StatusPolicy::StatusToken);

    let run = parser(config.normalize, 1).parse(fixture_path(MODERN).as_path())?;
    // The SSO test was recorded as "expected" despite its retry.
    let statuses: Vec<_> = run.tests.iter().map(|test| test.status).collect();
    assert_eq!(
        statuses,
        vec![
            TestStatus::Passed,
            TestStatus::Passed,
            TestStatus::Failed,
            TestStatus::Flaky,
            TestStatus::Skipped,
            TestStatus::Passed,
        ]
    );
    Ok(())
}

fn parse_shards() -> Result<Vec<NormalizedTestRun>> {
    [SHARD_1_OF_2, SHARD_2_OF_2]
        .into_iter()
        .enumerate()
        .map(|(index, file_name)| -> Result<NormalizedTestRun> {
            let run_id = u128::try_from(index).expect("small index") + 1;
            Ok(parser(NormalizeConfig::default(), run_id).parse(fixture_path(file_name).as_path())?)
        })
        .collect()
}

#[test]
fn shards_merge_into_one_run() -> Result<()> {
    let runs = parse_shards()?;
    assert!(are_runs_from_same_execution(&runs));
    assert_eq!(missing_shards(&runs), Vec::<u64>::new());
    assert_eq!(missing_shards(&runs[..1]), vec![2]);

    let expected_tests: usize = [SHARD_1_OF_2, SHARD_2_OF_2]
        .iter()
        .map(|name| EXPECTED_REPORTS.get(name).expect("fixture exists").tests.len())
        .sum();

    let merged = aggregate(runs)?;
    assert_eq!(merged.run_id, RunId::from_u128(1));
    assert_eq!(merged.tests.len(), expected_tests);
    assert_eq!(merged.totals.total, expected_tests);
    assert_eq!(merged.totals.failed, 1);
    assert_eq!(merged.totals.flaky, 1);
    assert_eq!(merged.totals.skipped, 1);
    assert_eq!(merged.duration, Duration::from_millis(MERGED_SHARDS_MILLIS));
    assert_eq!(merged.projects, vec!["chromium"]);

    let metadata = merged.metadata.expect("metadata present");
    assert_eq!(metadata["commit"], "4f2a9c1");
    assert_eq!(metadata["ci-job"], "shard-2");
    Ok(())
}

#[test]
fn same_shard_twice_is_inconsistent() -> Result<()> {
    let parser = parser(NormalizeConfig::default(), 1);
    let runs = vec![
        parser.parse(fixture_path(SHARD_1_OF_2).as_path())?,
        parser.parse(fixture_path(SHARD_1_OF_2).as_path())?,
    ];
    assert!(!are_runs_from_same_execution(&runs));
    Ok(())
}

#[test]
fn statistics_and_queries_over_fixture() -> Result<()> {
    let fixture = EXPECTED_REPORTS.get(MODERN).expect("fixture exists");
    let run = parser(NormalizeConfig::default(), 1).parse(fixture.json.as_bytes())?;

    let stats = compute_statistics(&run);
    assert_eq!(stats.totals.flaky, fixture.count(TestCaseFixtureStatus::Flaky));
    assert_eq!(stats.totals.failed, fixture.count(TestCaseFixtureStatus::Failed));
    assert_eq!(
        stats.totals.duration,
        millis_to_duration(fixture.total_millis())
    );
    assert_eq!(stats.durations.max, Duration::from_millis(2210));
    assert_eq!(stats.by_file.len(), 2);

    let firefox = filter_tests(&run, &TestPredicate::project("firefox"));
    assert_eq!(firefox.totals.total, 3);
    assert_eq!(firefox.totals.flaky, 2);

    let slowest = sort_tests(&run, &TestOrder::Duration.reverse());
    assert_eq!(
        slowest.tests[0].full_title,
        "cart.spec.ts › cart › applies a coupon"
    );

    let summary = summarize(&run, 3);
    assert_eq!(summary.slowest.len(), 3);
    assert_eq!(summary.failed.len(), 1);
    Ok(())
}

#[test]
fn merged_shards_export_to_junit() -> Result<()> {
    let merged = aggregate(parse_shards()?)?;
    let mut buf = Vec::new();
    write_junit(&merged, "testdigest", &mut buf)?;
    let xml = String::from_utf8(buf)?;

    assert!(xml.contains(r#"name="a.spec.ts""#), "{xml}");
    assert!(xml.contains(r#"name="b.spec.ts""#), "{xml}");
    assert_eq!(xml.matches("<flakyFailure").count(), 1, "{xml}");
    assert_eq!(xml.matches("<skipped").count(), 1, "{xml}");
    Ok(())
}
