// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture reports and their expected normalized contents, shared by the testdigest test
//! suites.

pub mod models;
pub mod reports;
