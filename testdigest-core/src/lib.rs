// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for testdigest: turning nested JSON test-run reports into a flat,
//! normalized model, merging the reports of sharded runs, and querying the result.
//!
//! The basic flow of operations is:
//!
//! 1. [`parse::ReportParser`] acquires bytes (from a path, a buffer, or an already-decoded
//!    [`serde_json::Value`]) and decodes them.
//! 2. [`schema::validate`] checks the decoded value and produces a typed
//!    [`RawReport`](schema::RawReport), reporting every structural issue at once.
//! 3. [`normalize::Normalizer`] flattens the suite tree into a
//!    [`NormalizedTestRun`](model::NormalizedTestRun).
//! 4. Optionally, [`aggregate::aggregate`] merges the runs of several shards into one.
//! 5. [`stats`] and [`query`] compute statistics and filtered or sorted views.

pub mod aggregate;
pub mod config;
pub mod errors;
mod helpers;
pub mod junit;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod query;
pub mod schema;
pub mod stats;
#[cfg(test)]
mod test_helpers;
