// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that run subcommands against the fixture reports.

use crate::{DigestExitCode, ExpectedError, OutputWriter, Result, TestdigestApp};
use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use clap::Parser;
use fixture_data::{
    models::TestCaseFixtureStatus,
    reports::{EXPECTED_REPORTS, LEGACY, MODERN, REPORTS_DIR, SHARD_1_OF_2, SHARD_2_OF_2},
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::Value;
use testdigest_core::{errors::ParseError, model::NormalizedTestRun};

fn fixture_path(file_name: &str) -> String {
    Utf8PathBuf::from(REPORTS_DIR)
        .join(file_name)
        .into_string()
}

struct Invocation {
    result: Result<i32>,
    stdout: Vec<u8>,
}

impl Invocation {
    fn run<'a>(args: impl IntoIterator<Item = &'a str>) -> Self {
        let app = TestdigestApp::try_parse_from(std::iter::once("testdigest").chain(args))
            .unwrap_or_else(|error| panic!("arguments should parse: {error}"));

        let mut output_writer = OutputWriter::new_test();
        let result = app.exec(&mut output_writer);
        let stdout = output_writer.stdout().expect("test writer").to_vec();
        Self { result, stdout }
    }

    fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(code) => *code,
            Err(error) => error.process_exit_code(),
        }
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.stdout).expect("stdout is JSON")
    }

    fn run_output(&self) -> NormalizedTestRun {
        serde_json::from_slice(&self.stdout).expect("stdout is a normalized run")
    }
}

#[test]
fn normalize_prints_the_run() {
    let fixture = EXPECTED_REPORTS.get(MODERN).expect("fixture exists");
    let invocation = Invocation::run(["normalize", fixture_path(MODERN).as_str()]);
    assert_eq!(invocation.exit_code(), DigestExitCode::OK);

    let run = invocation.run_output();
    assert_eq!(run.tests.len(), fixture.tests.len());
    assert_eq!(run.totals.passed, fixture.count(TestCaseFixtureStatus::Passed));
    assert_eq!(run.totals.failed, fixture.count(TestCaseFixtureStatus::Failed));
    assert_eq!(run.totals.flaky, fixture.count(TestCaseFixtureStatus::Flaky));
    assert_eq!(run.projects, fixture.projects);
}

#[test]
fn filters_and_sorting_apply_before_printing() {
    let invocation = Invocation::run([
        "normalize",
        "--status",
        "flaky",
        "--sort",
        "duration",
        "--reverse",
        fixture_path(MODERN).as_str(),
    ]);
    assert_eq!(invocation.exit_code(), DigestExitCode::OK);

    let run = invocation.run_output();
    let tests: Vec<_> = run
        .tests
        .iter()
        .map(|test| (test.full_title.as_str(), test.project.as_str()))
        .collect();
    assert_eq!(
        tests,
        vec![
            ("cart.spec.ts › cart › applies a coupon", "firefox"),
            ("auth.spec.ts › signs in with SSO", "firefox"),
        ]
    );
    assert_eq!(run.totals.total, 2);
    assert_eq!(run.totals.flaky, 2);
}

#[test]
fn merge_accepts_complementary_shards() {
    let invocation = Invocation::run([
        "merge",
        "--strict",
        fixture_path(SHARD_1_OF_2).as_str(),
        fixture_path(SHARD_2_OF_2).as_str(),
    ]);
    assert_eq!(invocation.exit_code(), DigestExitCode::OK);

    let run = invocation.run_output();
    let expected_tests: usize = [SHARD_1_OF_2, SHARD_2_OF_2]
        .iter()
        .map(|name| EXPECTED_REPORTS.get(name).expect("fixture exists").tests.len())
        .sum();
    assert_eq!(run.tests.len(), expected_tests);
    assert_eq!(run.shards.as_ref().map(Vec::len), Some(2));
}

#[test]
fn strict_merge_rejects_duplicate_shards() {
    let shard = fixture_path(SHARD_1_OF_2);

    let strict = Invocation::run(["merge", "--strict", shard.as_str(), shard.as_str()]);
    assert!(
        matches!(&strict.result, Err(ExpectedError::InconsistentShards { paths }) if paths.len() == 2),
        "{:?}",
        strict.result
    );
    assert_eq!(strict.exit_code(), DigestExitCode::INCONSISTENT_SHARDS);
    assert!(strict.stdout.is_empty());

    // Without --strict, the reports are merged anyway.
    let lenient = Invocation::run(["merge", shard.as_str(), shard.as_str()]);
    assert_eq!(lenient.exit_code(), DigestExitCode::OK);
    assert_eq!(lenient.run_output().tests.len(), 6);
}

#[test]
fn fail_on_failures_sets_the_exit_code() {
    let legacy = fixture_path(LEGACY);

    let failing = Invocation::run(["normalize", "--fail-on-failures", legacy.as_str()]);
    assert!(
        matches!(failing.result, Err(ExpectedError::TestsFailed { failed: 1 })),
        "{:?}",
        failing.result
    );
    assert_eq!(failing.exit_code(), DigestExitCode::TESTS_FAILED);
    // The run is still printed.
    assert_eq!(failing.run_output().tests.len(), 3);

    let passing = Invocation::run([
        "normalize",
        "--fail-on-failures",
        "--status",
        "passed",
        legacy.as_str(),
    ]);
    assert_eq!(passing.exit_code(), DigestExitCode::OK);

    let without_flag = Invocation::run(["normalize", legacy.as_str()]);
    assert_eq!(without_flag.exit_code(), DigestExitCode::OK);
}

#[test]
fn missing_report_is_invalid_input() {
    let dir = Utf8TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let invocation = Invocation::run(["stats", missing.as_str()]);
    match &invocation.result {
        Err(ExpectedError::ReportParseError {
            path,
            err: ParseError::NotFound { .. },
        }) => assert_eq!(path, &missing),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(invocation.exit_code(), DigestExitCode::INVALID_INPUT);
}

#[test]
fn invalid_report_is_invalid_input() {
    let dir = Utf8TempDir::new().unwrap();
    let report = dir.path().join("report.json");
    std::fs::write(&report, r#"{ "suites": [{ "title": 5 }] }"#).unwrap();

    let invocation = Invocation::run(["summary", report.as_str()]);
    let Err(ExpectedError::ReportParseError { err, .. }) = &invocation.result else {
        panic!("unexpected result: {:?}", invocation.result);
    };
    let validation = err.as_validation().expect("validation error");
    assert!(!validation.issues().is_empty());
    assert_eq!(invocation.exit_code(), DigestExitCode::INVALID_INPUT);
}

#[test]
fn bad_config_is_a_config_error() {
    let dir = Utf8TempDir::new().unwrap();
    let config = dir.path().join("testdigest.toml");
    std::fs::write(
        &config,
        indoc! {r#"
            [normalize]
            status-policy = "optimistic"
        "#},
    )
    .unwrap();

    let invocation = Invocation::run([
        "--config",
        config.as_str(),
        "normalize",
        fixture_path(MODERN).as_str(),
    ]);
    assert!(
        matches!(invocation.result, Err(ExpectedError::ConfigParseError { .. })),
        "{:?}",
        invocation.result
    );
    assert_eq!(invocation.exit_code(), DigestExitCode::CONFIG_ERROR);
}

#[test]
fn config_changes_status_policy_and_summary_size() {
    let dir = Utf8TempDir::new().unwrap();
    let config = dir.path().join("testdigest.toml");
    std::fs::write(
        &config,
        indoc! {r#"
            [normalize]
            status-policy = "status-token"

            [stats]
            slowest-count = 2
        "#},
    )
    .unwrap();

    let invocation = Invocation::run(["summary", fixture_path(MODERN).as_str(), "--config", config.as_str()]);
    assert_eq!(invocation.exit_code(), DigestExitCode::OK);

    let summary = invocation.json();
    assert_eq!(summary["slowest"].as_array().map(Vec::len), Some(2));
    // Under the status-token policy, only the test recorded as flaky counts as flaky.
    assert_eq!(summary["totals"]["flaky"], 1);

    let overridden = Invocation::run([
        "summary",
        "--slowest",
        "4",
        fixture_path(MODERN).as_str(),
        "--config",
        config.as_str(),
    ]);
    assert_eq!(overridden.json()["slowest"].as_array().map(Vec::len), Some(4));
}

#[test]
fn stats_respect_project_filter() {
    let invocation = Invocation::run(["stats", "--project", "firefox", fixture_path(MODERN).as_str()]);
    assert_eq!(invocation.exit_code(), DigestExitCode::OK);

    let stats = invocation.json();
    assert_eq!(stats["totals"]["total"], 3);
    assert_eq!(stats["by-project"].as_object().map(|map| map.len()), Some(1));
    assert!(stats["by-project"].get("firefox").is_some());
}

#[test]
fn junit_writes_the_report_file() {
    let dir = Utf8TempDir::new().unwrap();
    let junit_path = dir.path().join("reports").join("junit.xml");

    let invocation = Invocation::run([
        "junit",
        "--output",
        junit_path.as_str(),
        "--name",
        "nightly",
        fixture_path(SHARD_1_OF_2).as_str(),
        fixture_path(SHARD_2_OF_2).as_str(),
    ]);
    assert_eq!(invocation.exit_code(), DigestExitCode::OK);
    assert!(invocation.stdout.is_empty());

    let xml = std::fs::read_to_string(&junit_path).unwrap();
    assert!(xml.contains(r#"name="nightly""#), "{xml}");
    assert!(xml.contains(r#"name="a.spec.ts""#), "{xml}");
    assert!(xml.contains(r#"name="b.spec.ts""#), "{xml}");
    assert_eq!(xml.matches("<failure").count(), 1, "{xml}");
    assert_eq!(xml.matches("<skipped").count(), 1, "{xml}");
}

#[test]
fn invalid_grep_is_invalid_input() {
    let invocation = Invocation::run(["normalize", "--grep", "(", fixture_path(MODERN).as_str()]);
    assert_eq!(invocation.exit_code(), DigestExitCode::INVALID_INPUT);
    assert!(invocation.stdout.is_empty());
}
