// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exporting normalized runs as JUnit XML.
//!
//! Each file becomes a test suite, and each test a test case named after its full title, with
//! the project as the class name. Retries are recorded as reruns: flaky tests are successes with
//! `flakyFailure` entries, and failed tests carry `rerunFailure` entries.

use crate::{
    errors::JunitExportError,
    model::{NormalizedTest, NormalizedTestRun, TestStatus},
};
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestRerun, TestSuite};
use std::io;

/// Builds a JUnit report for `run`.
pub fn to_junit_report(run: &NormalizedTestRun, report_name: &str) -> Report {
    let mut test_suites: IndexMap<&str, TestSuite> = IndexMap::new();
    for test in &run.tests {
        test_suites
            .entry(test.file.as_str())
            .or_insert_with(|| TestSuite::new(test.file.as_str()))
            .add_test_case(test_case(test));
    }

    let mut report = Report::new(report_name);
    report
        .set_report_uuid(run.run_id)
        .set_timestamp(run.started_at)
        .set_time(run.duration)
        .add_test_suites(test_suites.into_values());
    report
}

/// Writes `run` as JUnit XML to `writer`.
pub fn write_junit(
    run: &NormalizedTestRun,
    report_name: &str,
    writer: impl io::Write,
) -> Result<(), JunitExportError> {
    to_junit_report(run, report_name).serialize(writer)?;
    Ok(())
}

fn test_case(test: &NormalizedTest) -> TestCase {
    let mut status = match test.status {
        TestStatus::Passed | TestStatus::Flaky => TestCaseStatus::success(),
        TestStatus::Failed => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            if let Some(error) = &test.error {
                if let Some(message) = &error.message {
                    status.set_message(message.as_str());
                }
                if let Some(stack) = error.stack.as_ref().or(error.message.as_ref()) {
                    status.set_description(stack.as_str());
                }
            }
            status
        }
        TestStatus::Skipped => TestCaseStatus::skipped(),
    };

    // Only the last attempt's details survive normalization, so earlier attempts are recorded
    // without output.
    if test.status != TestStatus::Skipped {
        for _ in 0..test.retries {
            status.add_rerun(TestRerun::new(NonSuccessKind::Failure));
        }
    }

    let mut test_case = TestCase::new(test.full_title.as_str(), status);
    test_case.set_classname(test.project.as_str());
    if let Some(duration) = test.duration {
        test_case.set_time(duration);
    }

    let attachment_lines: Vec<String> = test
        .attachments
        .iter()
        .flatten()
        .filter_map(|attachment| attachment.path.as_ref())
        .map(|path| format!("[[ATTACHMENT|{path}]]"))
        .collect();
    if !attachment_lines.is_empty() {
        test_case.set_system_out(attachment_lines.join("\n"));
    }

    test_case
}
