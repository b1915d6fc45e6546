// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalize, merge and summarize JSON test-run reports from the command line.
//!
//! The library half of this crate exists for the `testdigest` binary. For programmatic use, see
//! [`testdigest_core`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;
#[cfg(test)]
mod tests_integration;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::DigestExitCode;
#[doc(hidden)]
pub use output::OutputWriter;
