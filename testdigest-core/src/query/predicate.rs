// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::model::{NormalizedTest, TestStatus};
use regex::Regex;
use std::{ops, time::Duration};

/// Matcher for a string field of a test.
#[derive(Clone, Debug)]
pub enum TextMatcher {
    /// Exact value
    Equal(String),
    /// Simple contains test
    Contains(String),
    /// Test against a regex
    Regex(Regex),
}

impl PartialEq for TextMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Equal(s1), Self::Equal(s2)) => s1 == s2,
            (Self::Contains(s1), Self::Contains(s2)) => s1 == s2,
            (Self::Regex(r1), Self::Regex(r2)) => r1.as_str() == r2.as_str(),
            _ => false,
        }
    }
}

impl Eq for TextMatcher {}

impl TextMatcher {
    /// Returns true if `input` is accepted by this matcher.
    pub fn is_match(&self, input: &str) -> bool {
        match self {
            Self::Equal(text) => text == input,
            Self::Contains(text) => input.contains(text.as_str()),
            Self::Regex(regex) => regex.is_match(input),
        }
    }
}

/// A predicate over [`NormalizedTest`]s, used with [`filter_tests`](super::filter_tests).
///
/// Predicates form a tree: leaves test a single field, and [`all_of`](Self::all_of),
/// [`any_of`](Self::any_of) and negation (`!predicate`) combine them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestPredicate {
    /// Accepts tests with this status.
    Status(TestStatus),
    /// Accepts tests whose duration is at least this long. Missing durations count as zero.
    MinDuration(Duration),
    /// Accepts tests whose own title matches.
    Title(TextMatcher),
    /// Accepts tests whose project matches.
    Project(TextMatcher),
    /// Accepts tests whose file matches.
    File(TextMatcher),
    /// Accepts tests that were retried at least once.
    HasRetries,
    /// Accepts tests accepted by every predicate. An empty list accepts everything.
    All(Vec<TestPredicate>),
    /// Accepts tests accepted by at least one predicate. An empty list accepts nothing.
    Any(Vec<TestPredicate>),
    /// Accepts tests not accepted by the predicate.
    Not(Box<TestPredicate>),
}

impl TestPredicate {
    /// Accepts tests with the given status.
    pub fn status(status: TestStatus) -> Self {
        Self::Status(status)
    }

    /// Accepts tests that took at least `threshold`.
    pub fn min_duration(threshold: Duration) -> Self {
        Self::MinDuration(threshold)
    }

    /// Accepts tests whose title contains `text`.
    pub fn title_contains(text: impl Into<String>) -> Self {
        Self::Title(TextMatcher::Contains(text.into()))
    }

    /// Accepts tests whose title matches the regular expression `pattern`.
    pub fn title_matches(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Title(TextMatcher::Regex(Regex::new(pattern)?)))
    }

    /// Accepts tests that ran under `project`.
    pub fn project(project: impl Into<String>) -> Self {
        Self::Project(TextMatcher::Equal(project.into()))
    }

    /// Accepts tests defined in `file`.
    pub fn file(file: impl Into<String>) -> Self {
        Self::File(TextMatcher::Equal(file.into()))
    }

    /// Accepts tests that were retried.
    pub fn has_retries() -> Self {
        Self::HasRetries
    }

    /// Accepts tests accepted by every predicate in `predicates`.
    pub fn all_of(predicates: impl IntoIterator<Item = TestPredicate>) -> Self {
        Self::All(predicates.into_iter().collect())
    }

    /// Accepts tests accepted by any predicate in `predicates`.
    pub fn any_of(predicates: impl IntoIterator<Item = TestPredicate>) -> Self {
        Self::Any(predicates.into_iter().collect())
    }

    /// Returns true if `test` is accepted by this predicate.
    pub fn matches(&self, test: &NormalizedTest) -> bool {
        match self {
            Self::Status(status) => test.status == *status,
            Self::MinDuration(threshold) => test.duration_or_zero() >= *threshold,
            Self::Title(matcher) => matcher.is_match(&test.title),
            Self::Project(matcher) => matcher.is_match(&test.project),
            Self::File(matcher) => matcher.is_match(&test.file),
            Self::HasRetries => test.retries > 0,
            Self::All(predicates) => predicates.iter().all(|predicate| predicate.matches(test)),
            Self::Any(predicates) => predicates.iter().any(|predicate| predicate.matches(test)),
            Self::Not(predicate) => !predicate.matches(test),
        }
    }
}

impl ops::Not for TestPredicate {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}
