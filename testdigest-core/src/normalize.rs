// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattening validated reports into normalized runs.
//!
//! The [`Normalizer`] walks a [`RawReport`]'s suite tree depth-first and emits one
//! [`NormalizedTest`] per leaf test entity, regardless of which of the two leaf conventions
//! (specs or legacy test cases) produced it.
//!
//! Normalization is a pure function of its input, except for two run-level effects: the run ID,
//! and the start time when the report doesn't record one. Both are injected through the
//! [`RunIdGenerator`] and [`Clock`] traits.

use crate::{
    config::{NormalizeConfig, StatusPolicy},
    helpers::duration_from_millis_f64,
    model::{
        Annotation, Attachment, NormalizedTest, NormalizedTestRun, RunId, ShardInfo,
        SourceLocation, TestError, TestStatus, TestTotals,
    },
    schema::{
        AttemptHolder, AttemptStatus, LeafNode, Outcome, RawError, RawLocation, RawReport, Suite,
    },
};
use chrono::{DateTime, FixedOffset, Local};
use indexmap::IndexMap;
use std::{collections::BTreeSet, fmt, time::Duration};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

/// A source of the current time.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// A [`Clock`] backed by the system clock, in the local time zone.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A source of fresh run IDs.
pub trait RunIdGenerator: fmt::Debug + Send + Sync {
    /// Returns a new run ID.
    fn next_run_id(&self) -> RunId;
}

/// A [`RunIdGenerator`] that produces random (v4) UUIDs.
#[derive(Copy, Clone, Debug, Default)]
pub struct RandomRunIds;

impl RunIdGenerator for RandomRunIds {
    fn next_run_id(&self) -> RunId {
        RunId::new_v4()
    }
}

/// Computes totals over `tests` in a single linear pass.
pub fn calculate_totals(tests: &[NormalizedTest]) -> TestTotals {
    TestTotals::from_tests(tests)
}

/// Normalizes a report with the default configuration, system clock and random run IDs.
pub fn normalize(report: &RawReport) -> NormalizedTestRun {
    Normalizer::default().normalize(report)
}

/// Flattens validated reports into [`NormalizedTestRun`]s.
#[derive(Debug)]
pub struct Normalizer {
    config: NormalizeConfig,
    clock: Box<dyn Clock>,
    run_ids: Box<dyn RunIdGenerator>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizeConfig::default())
    }
}

impl Normalizer {
    /// Creates a new normalizer with the given configuration, using the system clock and random
    /// run IDs.
    pub fn new(config: NormalizeConfig) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            run_ids: Box::new(RandomRunIds),
        }
    }

    /// Replaces the clock used when a report does not record its start time.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the generator used for run IDs.
    pub fn with_run_ids(mut self, run_ids: impl RunIdGenerator + 'static) -> Self {
        self.run_ids = Box::new(run_ids);
        self
    }

    /// Returns the configuration used by this normalizer.
    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Normalizes a validated report.
    pub fn normalize(&self, report: &RawReport) -> NormalizedTestRun {
        // A report that declares exactly one project attributes unlabeled results to it.
        let declared: BTreeSet<&str> = report.config.declared_project_names().collect();
        let inherited_project = match declared.len() {
            1 => declared.first().copied(),
            _ => None,
        };

        let mut cx = FlattenCx {
            config: &self.config,
            tests: Vec::new(),
            observed_projects: BTreeSet::new(),
        };
        let mut path = Vec::new();
        for suite in &report.suites {
            cx.flatten_suite(suite, &mut path, &RawLocation::default(), inherited_project);
        }
        let FlattenCx {
            tests,
            observed_projects,
            ..
        } = cx;

        let totals = calculate_totals(&tests);
        let stats = report.stats.as_ref();

        let started_at = stats
            .and_then(|stats| stats.start_time.as_deref())
            .and_then(|start_time| match DateTime::parse_from_rfc3339(start_time) {
                Ok(started_at) => Some(started_at),
                Err(error) => {
                    warn!("ignoring unparseable report start time `{start_time}`: {error}");
                    None
                }
            })
            .unwrap_or_else(|| self.clock.now());
        let duration = stats
            .and_then(|stats| stats.duration_ms)
            .map_or(totals.duration, duration_from_millis_f64);
        let ended_at = started_at
            + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());

        let projects: Vec<String> = declared
            .into_iter()
            .map(ToOwned::to_owned)
            .chain(observed_projects)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let shards = report.config.shards.as_ref().map(|descriptors| {
            descriptors
                .iter()
                .map(|descriptor| ShardInfo {
                    current: descriptor.current,
                    total: descriptor.total,
                    duration,
                    test_count: tests.len(),
                })
                .collect()
        });

        let metadata = report
            .config
            .metadata
            .as_ref()
            .filter(|metadata| !metadata.is_empty())
            .map(|metadata| {
                metadata
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<IndexMap<_, _>>()
            });

        debug!(
            "normalized {} tests across {} top-level suites ({} projects)",
            tests.len(),
            report.suites.len(),
            projects.len(),
        );

        NormalizedTestRun {
            run_id: self.run_ids.next_run_id(),
            started_at,
            ended_at,
            duration,
            projects,
            shards,
            totals,
            tests,
            metadata,
        }
    }
}

/// Resolves the status of a test from its attempt-holder, according to `policy`.
pub fn resolve_status(policy: StatusPolicy, holder: &AttemptHolder, retries: u32) -> TestStatus {
    let Some(outcome) = coarse_outcome(holder) else {
        // Neither an outcome nor any attempts: nothing says the test passed.
        return TestStatus::Failed;
    };

    match policy {
        StatusPolicy::StatusToken => match outcome {
            Outcome::Expected => TestStatus::Passed,
            Outcome::Unexpected => TestStatus::Failed,
            Outcome::Skipped => TestStatus::Skipped,
            Outcome::Flaky => TestStatus::Flaky,
            Outcome::Other(_) => TestStatus::Failed,
        },
        StatusPolicy::RetryAware => {
            if outcome == Outcome::Skipped {
                TestStatus::Skipped
            } else if !outcome.is_passing() {
                TestStatus::Failed
            } else if retries > 0
                && holder
                    .results
                    .iter()
                    .any(|attempt| attempt.status.as_ref().is_some_and(AttemptStatus::is_failure))
            {
                TestStatus::Flaky
            } else {
                TestStatus::Passed
            }
        }
    }
}

/// Returns the holder's recorded outcome, or infers one from its last attempt.
fn coarse_outcome(holder: &AttemptHolder) -> Option<Outcome> {
    if let Some(outcome) = &holder.status {
        return Some(outcome.clone());
    }
    let attempt = holder.last_attempt()?;
    let outcome = match attempt.status {
        Some(AttemptStatus::Passed) => Outcome::Expected,
        Some(AttemptStatus::Skipped) => Outcome::Skipped,
        _ => Outcome::Unexpected,
    };
    Some(outcome)
}

/// Returns the retry count of a holder: the explicit count if reported, otherwise one less than
/// the number of attempts.
pub fn retry_count(holder: &AttemptHolder) -> u32 {
    holder.retries.unwrap_or_else(|| {
        u32::try_from(holder.results.len().saturating_sub(1)).unwrap_or(u32::MAX)
    })
}

/// A stable identifier for a test at position `index` in a run.
///
/// The position makes IDs unique within a run even when the project, file and title repeat.
fn test_id(project: &str, file: &str, full_title: &str, index: usize) -> String {
    let key = format!("{project}\u{1f}{file}\u{1f}{full_title}");
    format!("{:016x}-{index}", xxh3_64(key.as_bytes()))
}

struct FlattenCx<'cfg> {
    config: &'cfg NormalizeConfig,
    tests: Vec<NormalizedTest>,
    observed_projects: BTreeSet<String>,
}

/// One leaf test, as seen by the flattener: the trailing title segments, the leaf's own
/// location and its attempt-holder.
struct LeafEntry<'a> {
    title_tail: Vec<&'a str>,
    location: &'a RawLocation,
    holder: &'a AttemptHolder,
}

impl LeafNode {
    fn entries(&self) -> Vec<LeafEntry<'_>> {
        match self {
            LeafNode::Spec(spec) => spec
                .tests
                .iter()
                .map(|holder| {
                    let mut title_tail = vec![spec.title.as_str()];
                    title_tail.extend(holder.title.as_deref());
                    LeafEntry {
                        title_tail,
                        location: &spec.location,
                        holder,
                    }
                })
                .collect(),
            LeafNode::TestCase(case) => vec![LeafEntry {
                title_tail: vec![case.title.as_str()],
                location: &case.location,
                holder: &case.holder,
            }],
        }
    }
}

impl<'cfg> FlattenCx<'cfg> {
    fn flatten_suite<'r>(
        &mut self,
        suite: &'r Suite,
        path: &mut Vec<&'r str>,
        inherited: &RawLocation,
        project: Option<&str>,
    ) {
        let location = suite.location.or(inherited);
        path.push(&suite.title);

        for child in &suite.suites {
            self.flatten_suite(child, path, &location, project);
        }
        for leaf in &suite.leaves {
            for entry in leaf.entries() {
                self.emit(path, entry, &location, project);
            }
        }

        path.pop();
    }

    fn emit(
        &mut self,
        path: &[&str],
        entry: LeafEntry<'_>,
        suite_location: &RawLocation,
        inherited_project: Option<&str>,
    ) {
        let LeafEntry {
            title_tail,
            location,
            holder,
        } = entry;
        let config = self.config;

        let segments: Vec<&str> = path
            .iter()
            .copied()
            .chain(title_tail.iter().copied())
            .filter(|segment| !segment.is_empty())
            .collect();
        let full_title = segments.join(&config.title_separator);
        let title = title_tail.last().copied().unwrap_or_default().to_owned();

        let resolved = holder.location.or(&location.or(suite_location));
        let file = resolved
            .file
            .unwrap_or_else(|| config.unknown_file.clone());

        if let Some(project) = holder.explicit_project() {
            self.observed_projects.insert(project.to_owned());
        }
        let project = holder
            .explicit_project()
            .or(inherited_project)
            .unwrap_or(&config.default_project)
            .to_owned();

        let retries = retry_count(holder);
        let status = resolve_status(config.status_policy, holder, retries);
        let last = holder.last_attempt();

        let duration = last.map(|attempt| {
            attempt
                .duration_ms
                .map_or(Duration::ZERO, duration_from_millis_f64)
        });
        let error = last
            .and_then(|attempt| attempt.representative_error())
            .map(convert_error);
        let attachments = last
            .map(|attempt| {
                attempt
                    .attachments
                    .iter()
                    .map(|attachment| Attachment {
                        name: attachment.name.clone(),
                        content_type: attachment.content_type.clone(),
                        path: attachment.path.clone(),
                        body: attachment.body.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|attachments| !attachments.is_empty());
        let annotations = Some(
            holder
                .annotations
                .iter()
                .map(|annotation| Annotation {
                    kind: annotation.kind.clone(),
                    description: annotation.description.clone(),
                })
                .collect::<Vec<_>>(),
        )
        .filter(|annotations| !annotations.is_empty());

        let id = test_id(&project, &file, &full_title, self.tests.len());
        self.tests.push(NormalizedTest {
            id,
            title,
            full_title,
            file,
            line: resolved.line.unwrap_or(0),
            column: resolved.column.unwrap_or(0),
            project,
            status,
            duration,
            retries,
            error,
            attachments,
            annotations,
        });
    }
}

fn convert_error(error: &RawError) -> TestError {
    TestError {
        message: error.message.clone(),
        stack: error.stack.clone(),
        snippet: error.snippet.clone(),
        location: error.location.as_ref().map(|location| SourceLocation {
            file: location.file.clone().unwrap_or_default(),
            line: location.line.unwrap_or(0),
            column: location.column.unwrap_or(0),
        }),
    }
}
