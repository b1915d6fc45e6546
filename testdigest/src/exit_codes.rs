// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `testdigest` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum DigestExitCode {}

impl DigestExitCode {
    /// No errors occurred and testdigest exited normally.
    pub const OK: i32 = 0;

    /// `--fail-on-failures` was passed and one or more selected tests failed.
    pub const TESTS_FAILED: i32 = 1;

    /// A report could not be read, decoded or validated, or a filter argument was invalid.
    pub const INVALID_INPUT: i32 = 2;

    /// `merge --strict` was passed and the reports are not the shards of a single execution.
    pub const INCONSISTENT_SHARDS: i32 = 3;

    /// The configuration could not be loaded.
    pub const CONFIG_ERROR: i32 = 4;

    /// Writing output to stdout or to a file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 5;
}
