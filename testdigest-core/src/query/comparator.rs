// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::model::{NormalizedTest, TestStatus};
use std::cmp::Ordering;

/// An ordering over [`NormalizedTest`]s, used with [`sort_tests`](super::sort_tests).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestOrder {
    /// Shortest first. Missing durations count as zero.
    Duration,
    /// By the test's own title.
    Title,
    /// By the full title.
    FullTitle,
    /// By file.
    File,
    /// By project.
    Project,
    /// Failed tests first, then flaky, passed and skipped.
    Status,
    /// Fewest retries first.
    Retries,
    /// Each ordering in turn; the first that tells two tests apart wins.
    Chain(Vec<TestOrder>),
    /// The inverse of the ordering.
    Reverse(Box<TestOrder>),
}

impl TestOrder {
    /// Orders by each of `orders` in turn.
    pub fn chain(orders: impl IntoIterator<Item = TestOrder>) -> Self {
        Self::Chain(orders.into_iter().collect())
    }

    /// Returns the inverse of this ordering.
    pub fn reverse(self) -> Self {
        match self {
            Self::Reverse(inner) => *inner,
            other => Self::Reverse(Box::new(other)),
        }
    }

    /// Compares two tests according to this ordering.
    pub fn compare(&self, a: &NormalizedTest, b: &NormalizedTest) -> Ordering {
        match self {
            Self::Duration => a.duration_or_zero().cmp(&b.duration_or_zero()),
            Self::Title => a.title.cmp(&b.title),
            Self::FullTitle => a.full_title.cmp(&b.full_title),
            Self::File => a.file.cmp(&b.file),
            Self::Project => a.project.cmp(&b.project),
            Self::Status => status_rank(a.status).cmp(&status_rank(b.status)),
            Self::Retries => a.retries.cmp(&b.retries),
            Self::Chain(orders) => orders
                .iter()
                .map(|order| order.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal),
            Self::Reverse(inner) => inner.compare(a, b).reverse(),
        }
    }
}

fn status_rank(status: TestStatus) -> u8 {
    match status {
        TestStatus::Failed => 0,
        TestStatus::Flaky => 1,
        TestStatus::Passed => 2,
        TestStatus::Skipped => 3,
    }
}
