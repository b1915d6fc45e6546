// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging the runs of sharded executions.
//!
//! A sharded execution splits one logical test run across several partitions, each producing
//! its own report. [`aggregate`] merges the normalized runs back together, and
//! [`are_runs_from_same_execution`] and [`missing_shards`] check whether a set of runs plausibly
//! belongs together.

use crate::{
    errors::AggregateError,
    model::{NormalizedTestRun, TestTotals},
};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::BTreeSet;
use tracing::debug;

/// Merges several runs into one.
///
/// A single run is returned as-is. Otherwise, tests and shard descriptors are concatenated in
/// input order, projects are unioned, totals are recomputed and the run spans from the earliest
/// start to the latest end. The first run's ID is kept, and metadata maps are merged with later
/// runs taking precedence.
pub fn aggregate(runs: Vec<NormalizedTestRun>) -> Result<NormalizedTestRun, AggregateError> {
    let mut runs = runs.into_iter();
    let Some(first) = runs.next() else {
        return Err(AggregateError::NoRuns);
    };
    let rest: Vec<_> = runs.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let run_count = rest.len() + 1;
    let run_id = first.run_id;
    let mut started_at = first.started_at;
    let mut ended_at = first.ended_at;
    let mut projects = BTreeSet::new();
    let mut shards = None::<Vec<_>>;
    let mut metadata = None::<IndexMap<_, _>>;
    let mut tests = Vec::with_capacity(
        first.tests.len() + rest.iter().map(|run| run.tests.len()).sum::<usize>(),
    );

    for run in std::iter::once(first).chain(rest) {
        started_at = started_at.min(run.started_at);
        ended_at = ended_at.max(run.ended_at);
        projects.extend(run.projects);
        if let Some(run_shards) = run.shards {
            shards.get_or_insert_with(Vec::new).extend(run_shards);
        }
        if let Some(run_metadata) = run.metadata {
            metadata
                .get_or_insert_with(IndexMap::new)
                .extend(run_metadata);
        }
        tests.extend(run.tests);
    }

    let totals = TestTotals::from_tests(&tests);
    let duration = (ended_at - started_at).to_std().unwrap_or_default();
    debug!(
        "aggregated {run_count} runs: {} tests, {} failed, {} shard descriptors",
        totals.total,
        totals.failed,
        shards.as_ref().map_or(0, Vec::len),
    );

    Ok(NormalizedTestRun {
        run_id,
        started_at,
        ended_at,
        duration,
        projects: projects.into_iter().collect(),
        shards,
        totals,
        tests,
        metadata,
    })
}

/// Returns true if `runs` look like the shards of a single execution.
///
/// This is the case if every run carries shard information, all shards agree on the total
/// number of partitions, and no partition is claimed twice. An incomplete set of shards is still
/// considered consistent; use [`missing_shards`] to find the gaps.
pub fn are_runs_from_same_execution(runs: &[NormalizedTestRun]) -> bool {
    if runs.len() <= 1 {
        return true;
    }

    let mut seen = BTreeSet::new();
    let mut total = None;
    for run in runs {
        let shards = match &run.shards {
            Some(shards) if !shards.is_empty() => shards,
            _ => return false,
        };
        for shard in shards {
            if *total.get_or_insert(shard.total) != shard.total {
                return false;
            }
            if !seen.insert(shard.current) {
                return false;
            }
        }
    }
    true
}

/// Returns the partitions in `1..=total` that no run claims.
///
/// Returns an empty list if no run carries shard information, or if the runs disagree on the
/// total number of partitions.
pub fn missing_shards(runs: &[NormalizedTestRun]) -> Vec<u64> {
    let shards = runs
        .iter()
        .filter_map(|run| run.shards.as_deref())
        .flatten()
        .collect::<Vec<_>>();
    let Ok(total) = shards.iter().map(|shard| shard.total).all_equal_value() else {
        return Vec::new();
    };

    let seen: BTreeSet<_> = shards.iter().map(|shard| shard.current).collect();
    (1..=total).filter(|index| !seen.contains(index)).collect()
}
